// src/semantic/check.rs
// Cross-file analysis: collect declarations per file in parallel, merge them
// in input order, resolve types, then check function bodies in parallel
// against the merged table.

use hashbrown::HashMap;
use rayon::prelude::*;

use super::{
    symbols::{Symbol, SymbolKind, SymbolTable, qualified},
    types::{Type, binary_result},
};
use crate::{
    diagnostic::{Diagnostic, Location, Stage},
    ir::tac::normalize_int,
    lexer::tokens::{Token, TokenKind},
    parser::tree::{Expr, Function, Item, MalformedTree, Node, ParseTree, Stmt},
    scheduler::FileOutcome,
};

fn semantic(message: impl Into<String>, at: &Token) -> Diagnostic {
    Diagnostic::error(Stage::Semantic, message).at(at)
}

fn malformed(e: MalformedTree) -> Diagnostic {
    Diagnostic::error(Stage::Semantic, format!("malformed {} node", e.kind)).at_position(
        e.file,
        e.line,
        e.column,
    )
}

fn duplicate(name: &str, site: &Token, first: Location) -> Diagnostic {
    semantic(format!("duplicate declaration of `{name}`"), site)
        .with_note(format!("`{name}` was first declared here"), Some(first))
}

/// Integer literals must fit the 64-bit operand they lower to.
fn literal_overflow(token: &Token) -> Option<Diagnostic> {
    let overflows = token.kind == TokenKind::Number
        && !token.lexeme.contains('.')
        && normalize_int(&token.lexeme).is_none();
    overflows.then(|| {
        semantic(
            format!("integer literal `{}` does not fit in 64 bits", token.lexeme),
            token,
        )
    })
}

#[derive(Debug, Default)]
pub struct Analysis {
    pub symbols: SymbolTable,
    pub diagnostics: Vec<Diagnostic>,
    /// Index of the analyzed file each diagnostic belongs to, parallel to
    /// `diagnostics`.
    pub origins: Vec<usize>,
}

impl Analysis {
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    fn push(&mut self, origin: usize, d: Diagnostic) {
        self.diagnostics.push(d);
        self.origins.push(origin);
    }

    fn extend(&mut self, origin: usize, ds: impl IntoIterator<Item = Diagnostic>) {
        for d in ds {
            self.push(origin, d);
        }
    }
}

// ---------- pass 1: declarations ----------

struct Decl<'t> {
    name: String,
    kind: SymbolKind,
    site: &'t Token,
    /// alias target, variable type or return type
    type_name: &'t Token,
    params: Vec<&'t Token>,
    init: Option<&'t Token>,
    /// declaring function of a parameter
    owner: Option<&'t Token>,
    /// position of a parameter in its function's list
    slot: usize,
}

#[derive(Default)]
struct Collected<'t> {
    decls: Vec<Decl<'t>>,
    diagnostics: Vec<Diagnostic>,
}

fn collect_file(tree: &ParseTree) -> Collected<'_> {
    let mut out = Collected::default();
    for node in tree.declarations() {
        let item = match Item::view(node) {
            Ok(item) => item,
            Err(e) => {
                out.diagnostics.push(malformed(e));
                continue;
            }
        };
        match item {
            Item::Type { name, target } => out.decls.push(Decl {
                name: name.lexeme.clone(),
                kind: SymbolKind::Type,
                site: name,
                type_name: target,
                params: Vec::new(),
                init: None,
                owner: None,
                slot: 0,
            }),
            Item::Global { name, ty, init } => out.decls.push(Decl {
                name: name.lexeme.clone(),
                kind: SymbolKind::Variable,
                site: name,
                type_name: ty,
                params: Vec::new(),
                init,
                owner: None,
                slot: 0,
            }),
            Item::Func(f) => {
                out.decls.push(Decl {
                    name: f.name.lexeme.clone(),
                    kind: SymbolKind::Function,
                    site: f.name,
                    type_name: f.ret,
                    params: f.params.iter().map(|p| p.ty).collect(),
                    init: None,
                    owner: None,
                    slot: 0,
                });
                for (slot, p) in f.params.iter().enumerate() {
                    out.decls.push(Decl {
                        name: qualified(&f.name.lexeme, &p.name.lexeme),
                        kind: SymbolKind::Variable,
                        site: p.name,
                        type_name: p.ty,
                        params: Vec::new(),
                        init: None,
                        owner: Some(f.name),
                        slot,
                    });
                }
            }
            Item::End(_) => {}
        }
    }
    out
}

enum Alias {
    Resolving,
    Done(Option<Type>),
}

/// Type resolution over the merged table. Broken aliases are reported once,
/// where they are declared; uses of them resolve to `None` silently.
struct Resolver<'a> {
    symbols: &'a SymbolTable,
    /// alias target and the file declaring the alias
    targets: HashMap<&'a str, (&'a Token, usize)>,
    memo: HashMap<String, Alias>,
    /// file of the name being resolved
    current: usize,
    diagnostics: Vec<(usize, Diagnostic)>,
}

impl Resolver<'_> {
    fn type_of_name(&mut self, token: &Token) -> Option<Type> {
        if let Some(t) = Type::builtin(token.kind) {
            return Some(t);
        }
        let name = token.lexeme.as_str();
        let symbols = self.symbols;
        match symbols.get(name) {
            None => {
                let d = semantic(format!("unknown type `{name}`"), token);
                self.diagnostics.push((self.current, d));
                None
            }
            Some(sym) if sym.kind != SymbolKind::Type => {
                let d = semantic(
                    format!("`{name}` is {}, not a type", sym.kind.describe()),
                    token,
                )
                .with_note(format!("`{name}` is declared here"), Some(sym.location()));
                self.diagnostics.push((self.current, d));
                None
            }
            Some(_) => self.alias(name),
        }
    }

    fn alias(&mut self, name: &str) -> Option<Type> {
        match self.memo.get(name) {
            Some(Alias::Done(t)) => return *t,
            Some(Alias::Resolving) => {
                let symbols = self.symbols;
                if let (Some(sym), Some(&(_, origin))) = (symbols.get(name), self.targets.get(name))
                {
                    let d = Diagnostic::error(
                        Stage::Semantic,
                        format!("cyclic type alias `{name}`"),
                    )
                    .at_position(sym.file.clone(), sym.line, sym.column);
                    self.diagnostics.push((origin, d));
                }
                return None;
            }
            None => {}
        }
        let Some(&(target, origin)) = self.targets.get(name) else {
            return None;
        };
        self.memo.insert(name.to_string(), Alias::Resolving);
        let outer = std::mem::replace(&mut self.current, origin);
        let ty = self.type_of_name(target);
        self.current = outer;
        self.memo.insert(name.to_string(), Alias::Done(ty));
        ty
    }
}

// ---------- pass 2: bodies ----------

struct Local<'t> {
    ty: Option<Type>,
    site: &'t Token,
}

/// Read-only type lookup used while checking bodies.
fn lookup_type(token: &Token, symbols: &SymbolTable) -> Result<Option<Type>, Diagnostic> {
    if let Some(t) = Type::builtin(token.kind) {
        return Ok(Some(t));
    }
    let name = &token.lexeme;
    match symbols.get(name) {
        Some(sym) if sym.kind == SymbolKind::Type => Ok(sym.ty),
        Some(sym) => Err(semantic(
            format!("`{name}` is {}, not a type", sym.kind.describe()),
            token,
        )),
        None => Err(semantic(format!("unknown type `{name}`"), token)),
    }
}

struct BodyChecker<'a, 't> {
    symbols: &'a SymbolTable,
    func: &'a Function<'t>,
    ret: Option<Type>,
    scope: HashMap<&'t str, Local<'t>>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a, 't> BodyChecker<'a, 't> {
    fn new(symbols: &'a SymbolTable, func: &'a Function<'t>, first_seen: bool) -> Self {
        let mut checker = Self {
            symbols,
            func,
            ret: None,
            scope: HashMap::new(),
            diagnostics: Vec::new(),
        };
        let fname = &func.name.lexeme;
        if first_seen {
            checker.ret = symbols.get(fname).and_then(|s| s.ty);
            for p in &func.params {
                // a parameter that lost to an earlier one of the same name
                // was already reported when declarations were merged
                if let Some(sym) = symbols.local(fname, &p.name.lexeme) {
                    if sym.is_declared_by(p.name) {
                        checker.scope.insert(
                            p.name.lexeme.as_str(),
                            Local {
                                ty: sym.ty,
                                site: p.name,
                            },
                        );
                    }
                }
            }
        } else {
            checker.ret = lookup_type(func.ret, symbols).ok().flatten();
            for p in &func.params {
                let ty = lookup_type(p.ty, symbols).ok().flatten();
                checker
                    .scope
                    .entry(p.name.lexeme.as_str())
                    .or_insert(Local { ty, site: p.name });
            }
        }
        checker
    }

    fn error(&mut self, message: String, at: &Token) {
        self.diagnostics.push(semantic(message, at));
    }

    fn run(mut self, body: &'t [Node]) -> (Vec<Diagnostic>, Vec<Symbol>) {
        let mut locals = Vec::new();
        for node in body {
            match Stmt::view(node) {
                Ok(stmt) => {
                    if let Some(local) = self.statement(stmt) {
                        locals.push(local);
                    }
                }
                Err(e) => self.diagnostics.push(malformed(e)),
            }
        }
        (self.diagnostics, locals)
    }

    /// Returns the symbol of a newly declared local.
    fn statement(&mut self, stmt: Stmt<'t>) -> Option<Symbol> {
        match stmt {
            Stmt::Local { name, ty, init } => {
                let declared = match lookup_type(ty, self.symbols) {
                    Ok(t) => t,
                    Err(d) => {
                        self.diagnostics.push(d);
                        None
                    }
                };
                if let Some(init) = &init {
                    let found = self.expr(init);
                    if let (Some(want), Some(got)) = (declared, found) {
                        if want != got {
                            self.error(
                                format!(
                                    "type mismatch: `{}` is declared `{want}` but initialized with `{got}`",
                                    name.lexeme
                                ),
                                init.anchor(),
                            );
                        }
                    }
                }
                if let Some(prev) = self.scope.get(name.lexeme.as_str()) {
                    let d = duplicate(&name.lexeme, name, Location::from(prev.site));
                    self.diagnostics.push(d);
                    return None;
                }
                self.scope.insert(
                    name.lexeme.as_str(),
                    Local {
                        ty: declared,
                        site: name,
                    },
                );
                let mut sym = Symbol::new(
                    qualified(&self.func.name.lexeme, &name.lexeme),
                    SymbolKind::Variable,
                    name,
                );
                sym.ty = declared;
                Some(sym)
            }
            Stmt::Assign { target, value } => {
                let want = self.assignable(target);
                let got = self.expr(&value);
                if let (Some(want), Some(got)) = (want, got) {
                    if want != got {
                        self.error(
                            format!(
                                "type mismatch: cannot assign `{got}` to `{}` of type `{want}`",
                                target.lexeme
                            ),
                            value.anchor(),
                        );
                    }
                }
                None
            }
            Stmt::Call { callee, args } => {
                self.call(callee, &args);
                None
            }
            Stmt::Return { value, .. } => {
                let got = self.expr(&value);
                if let (Some(want), Some(got)) = (self.ret, got) {
                    if want != got {
                        self.error(
                            format!(
                                "type mismatch: `{}` returns `{want}` but the value is `{got}`",
                                self.func.name.lexeme
                            ),
                            value.anchor(),
                        );
                    }
                }
                None
            }
        }
    }

    fn assignable(&mut self, target: &Token) -> Option<Type> {
        let name = target.lexeme.as_str();
        if let Some(local) = self.scope.get(name) {
            return local.ty;
        }
        match self.symbols.get(name) {
            Some(sym) if sym.kind == SymbolKind::Variable => sym.ty,
            Some(sym) => {
                let msg = format!("cannot assign to `{name}`: it is {}", sym.kind.describe());
                self.error(msg, target);
                None
            }
            None => {
                self.error(format!("undeclared identifier `{name}`"), target);
                None
            }
        }
    }

    /// Type of a literal or a name used as a value.
    fn value(&mut self, token: &Token) -> Option<Type> {
        if token.kind != TokenKind::Ident {
            self.diagnostics.extend(literal_overflow(token));
            return Type::of_literal(token);
        }
        let name = token.lexeme.as_str();
        if let Some(local) = self.scope.get(name) {
            return local.ty;
        }
        match self.symbols.get(name) {
            Some(sym) if sym.kind == SymbolKind::Variable => sym.ty,
            Some(sym) => {
                let msg = format!("`{name}` is {}, not a value", sym.kind.describe());
                self.error(msg, token);
                None
            }
            None => {
                self.error(format!("undeclared identifier `{name}`"), token);
                None
            }
        }
    }

    fn call(&mut self, callee: &Token, args: &[&Token]) -> Option<Type> {
        let arg_types: Vec<Option<Type>> = args.iter().map(|a| self.value(a)).collect();
        let name = callee.lexeme.as_str();
        if self.scope.contains_key(name) {
            self.error(format!("`{name}` is a variable, not a function"), callee);
            return None;
        }
        let symbols = self.symbols;
        let Some(sym) = symbols.get(name) else {
            self.error(format!("undeclared function `{name}`"), callee);
            return None;
        };
        if sym.kind != SymbolKind::Function {
            let msg = format!("`{name}` is {}, not a function", sym.kind.describe());
            self.error(msg, callee);
            return None;
        }
        if sym.params.len() != args.len() {
            let msg = format!(
                "`{name}` takes {} argument(s) but {} were given",
                sym.params.len(),
                args.len()
            );
            self.error(msg, callee);
            return sym.ty;
        }
        for (i, ((want, got), arg)) in sym.params.iter().zip(&arg_types).zip(args).enumerate() {
            if let (Some(want), Some(got)) = (want, got) {
                if want != got {
                    let msg = format!(
                        "type mismatch: argument {} of `{name}` expects `{want}`, found `{got}`",
                        i + 1
                    );
                    self.error(msg, arg);
                }
            }
        }
        sym.ty
    }

    fn expr(&mut self, e: &Expr<'t>) -> Option<Type> {
        match e {
            Expr::Literal(t) | Expr::Name(t) => self.value(t),
            Expr::Call { callee, args } => self.call(callee, args),
            Expr::Binary { op, lhs, rhs } => {
                let (l, r) = (self.expr(lhs), self.expr(rhs));
                let (l, r) = (l?, r?);
                let result = binary_result(op.kind, l, r);
                if result.is_none() {
                    let msg = format!(
                        "type mismatch: operator `{}` cannot be applied to `{l}` and `{r}`",
                        op.lexeme
                    );
                    self.error(msg, op);
                }
                result
            }
        }
    }
}

fn check_file(tree: &ParseTree, symbols: &SymbolTable) -> (Vec<Diagnostic>, Vec<Symbol>) {
    let mut diagnostics = Vec::new();
    let mut locals = Vec::new();
    for node in tree.declarations() {
        let Ok(Item::Func(func)) = Item::view(node) else {
            // non-functions were checked, and malformed items reported,
            // while collecting declarations
            continue;
        };
        let first_seen = symbols
            .get(&func.name.lexeme)
            .is_some_and(|s| s.kind == SymbolKind::Function && s.is_declared_by(func.name));
        let (d, l) = BodyChecker::new(symbols, &func, first_seen).run(func.body);
        diagnostics.extend(d);
        if first_seen {
            locals.extend(l);
        }
    }
    (diagnostics, locals)
}

pub struct SemanticAnalyzer;

impl SemanticAnalyzer {
    /// Analyzes every successfully parsed file; failed files are skipped.
    /// Origins index `outcomes`.
    pub fn analyze(outcomes: &[FileOutcome]) -> Analysis {
        let (indices, trees): (Vec<usize>, Vec<&ParseTree>) = outcomes
            .iter()
            .enumerate()
            .filter_map(|(i, o)| o.result.as_ref().ok().map(|t| (i, t)))
            .unzip();
        let mut analysis = Self::analyze_trees(&trees);
        for origin in &mut analysis.origins {
            *origin = indices[*origin];
        }
        analysis
    }

    /// Origins index `trees`.
    pub fn analyze_trees(trees: &[&ParseTree]) -> Analysis {
        let mut analysis = Analysis::default();
        let mut symbols = SymbolTable::new();

        // pass 1: collect per file in parallel, merge in input order
        let collected: Vec<Collected> = trees.par_iter().map(|t| collect_file(t)).collect();
        let mut accepted: Vec<(usize, &Decl)> = Vec::new();
        for (i, file) in collected.iter().enumerate() {
            analysis.extend(i, file.diagnostics.iter().cloned());
            for decl in &file.decls {
                if let Some(owner) = decl.owner {
                    let owner_won = symbols
                        .get(&owner.lexeme)
                        .is_some_and(|s| s.kind == SymbolKind::Function && s.is_declared_by(owner));
                    if !owner_won {
                        continue;
                    }
                }
                match symbols.declare(Symbol::new(decl.name.clone(), decl.kind, decl.site)) {
                    Ok(()) => accepted.push((i, decl)),
                    Err(first) => {
                        let shown = decl.site.lexeme.as_str();
                        analysis.push(i, duplicate(shown, decl.site, first.location()));
                    }
                }
            }
        }
        log::debug!(
            "[semantic] {} files, {} declarations merged",
            trees.len(),
            symbols.len()
        );

        // type resolution
        let resolved = {
            let mut resolver = Resolver {
                symbols: &symbols,
                targets: accepted
                    .iter()
                    .filter(|(_, d)| d.kind == SymbolKind::Type)
                    .map(|&(i, d)| (d.name.as_str(), (d.type_name, i)))
                    .collect(),
                memo: HashMap::new(),
                current: 0,
                diagnostics: Vec::new(),
            };
            let mut resolved = Vec::with_capacity(accepted.len());
            let mut param_types: HashMap<&str, Vec<Option<Type>>> = HashMap::new();
            for &(i, decl) in &accepted {
                resolver.current = i;
                let (ty, params) = match (decl.kind, decl.owner) {
                    (SymbolKind::Type, _) => (resolver.alias(&decl.name), Vec::new()),
                    // a parameter takes the type resolved with its function
                    (_, Some(owner)) => {
                        let ty = param_types
                            .get(owner.lexeme.as_str())
                            .and_then(|p| p.get(decl.slot).copied())
                            .flatten();
                        (ty, Vec::new())
                    }
                    (kind, None) => {
                        let ty = resolver.type_of_name(decl.type_name);
                        let params: Vec<Option<Type>> =
                            decl.params.iter().map(|p| resolver.type_of_name(p)).collect();
                        if kind == SymbolKind::Function {
                            param_types.insert(decl.name.as_str(), params.clone());
                        }
                        (ty, params)
                    }
                };
                if let (Some(init), Some(want)) = (decl.init, ty) {
                    if let Some(d) = literal_overflow(init) {
                        resolver.diagnostics.push((i, d));
                    }
                    if let Some(got) = Type::of_literal(init) {
                        if got != want {
                            let d = semantic(
                                format!(
                                    "type mismatch: `{}` is declared `{want}` but initialized with `{got}`",
                                    decl.name
                                ),
                                init,
                            );
                            resolver.diagnostics.push((i, d));
                        }
                    }
                }
                resolved.push((decl.name.as_str(), ty, params));
            }
            for (origin, d) in resolver.diagnostics {
                analysis.push(origin, d);
            }
            resolved
        };
        for (name, ty, params) in resolved {
            if let Some(sym) = symbols.get_mut(name) {
                sym.ty = ty;
                sym.params = params;
            }
        }

        // pass 2: bodies per file in parallel against the read-only table
        let checked: Vec<(Vec<Diagnostic>, Vec<Symbol>)> = {
            let table = &symbols;
            trees.par_iter().map(|t| check_file(t, table)).collect()
        };
        for (i, (d, locals)) in checked.into_iter().enumerate() {
            analysis.extend(i, d);
            for local in locals {
                if let Err(existing) = symbols.declare(local) {
                    log::debug!("[semantic] {} already in the table", existing.name);
                }
            }
        }

        analysis.symbols = symbols;
        analysis
    }
}

#[cfg(test)]
mod tests {
    use std::{io::Cursor, sync::Arc};

    use super::*;
    use crate::{
        lexer::{KeywordDictionary, Lexer, SourceReader},
        parser::{Parser, tables::build_transition_table},
    };

    fn tree(file: &str, src: &str) -> ParseTree {
        let dict = KeywordDictionary::with_keywords();
        let reader = SourceReader::new(Cursor::new(src.as_bytes().to_vec()));
        let tokens = Lexer::new(reader, &dict, Arc::from(file))
            .tokenize()
            .unwrap();
        Parser::new(&build_transition_table())
            .parse(&tokens)
            .unwrap()
    }

    fn messages(files: &[(&str, &str)]) -> Vec<String> {
        let trees: Vec<ParseTree> = files.iter().map(|(f, s)| tree(f, s)).collect();
        let refs: Vec<&ParseTree> = trees.iter().collect();
        SemanticAnalyzer::analyze_trees(&refs)
            .diagnostics
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn clean_program_resolves_aliases_and_locals() {
        let t = tree(
            "a.src",
            "type n = int;\ntype m = n;\nvar g: m = 1;\nfunc f(x: m): n { var y: int = x + g; return y; }\n",
        );
        let analysis = SemanticAnalyzer::analyze_trees(&[&t]);
        assert!(analysis.is_valid(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.symbols.get("m").unwrap().ty, Some(Type::Int));
        assert_eq!(analysis.symbols.get("f").unwrap().params, [Some(Type::Int)]);
        assert_eq!(analysis.symbols.local("f", "y").unwrap().ty, Some(Type::Int));
    }

    #[test]
    fn undeclared_names_and_functions() {
        let got = messages(&[("a.src", "func f(): int {\n  x = 1;\n  g();\n  return 0;\n}\n")]);
        assert_eq!(
            got,
            [
                "a.src:2:3: error[semantic]: undeclared identifier `x`",
                "a.src:3:3: error[semantic]: undeclared function `g`",
            ]
        );
    }

    #[test]
    fn arity_and_argument_types() {
        let got = messages(&[(
            "a.src",
            "func f(a: int, b: bool): int { return a; }\nfunc g(): int { f(1); f(1, 2); return 0; }\n",
        )]);
        assert_eq!(got.len(), 2, "{got:?}");
        assert!(got[0].ends_with("`f` takes 2 argument(s) but 1 were given"));
        assert!(got[1].ends_with("argument 2 of `f` expects `bool`, found `int`"));
    }

    #[test]
    fn cyclic_alias_is_reported_once() {
        let got = messages(&[("a.src", "type a = b;\ntype b = a;\nvar v: a;\n")]);
        assert_eq!(got, ["a.src:1:6: error[semantic]: cyclic type alias `a`"]);
    }

    #[test]
    fn kind_confusion() {
        let got = messages(&[(
            "a.src",
            "var v: int;\nvar w: v;\nfunc f(): int { v(); return f; }\n",
        )]);
        assert_eq!(got.len(), 3, "{got:?}");
        assert!(got[0].contains("2:8: error[semantic]: `v` is a variable, not a type"));
        assert!(got[1].contains("`v` is a variable, not a function"));
        assert!(got[2].contains("`f` is a function, not a value"));
    }

    #[test]
    fn mismatches_in_locals_assignments_and_returns() {
        let got = messages(&[(
            "a.src",
            "func f(): bool {\n  var x: int = true;\n  x = 1.5;\n  return 1 + 2;\n}\n",
        )]);
        assert_eq!(
            got,
            [
                "a.src:2:16: error[semantic]: type mismatch: `x` is declared `int` but initialized with `bool`",
                "a.src:3:7: error[semantic]: type mismatch: cannot assign `float` to `x` of type `int`",
                "a.src:4:10: error[semantic]: type mismatch: `f` returns `bool` but the value is `int`",
            ]
        );
    }

    #[test]
    fn duplicate_local_points_at_the_first() {
        let got = messages(&[(
            "a.src",
            "func f(): int {\n  var x: int;\n  var x: int;\n  return 0;\n}\n",
        )]);
        assert_eq!(
            got,
            ["a.src:3:7: error[semantic]: duplicate declaration of `x`\n  = note: `x` was first declared here at a.src:2:7"]
        );
    }

    #[test]
    fn oversized_integer_literal() {
        let got = messages(&[("a.src", "var big: int = 0x1FFFFFFFFFFFFFFFF;\n")]);
        assert_eq!(got.len(), 1);
        assert!(got[0].ends_with("integer literal `0x1FFFFFFFFFFFFFFFF` does not fit in 64 bits"));
    }

    #[test]
    fn losing_function_duplicate_brings_no_parameter_noise() {
        let got = messages(&[
            ("a.src", "func f(x: int): int { return x; }\n"),
            ("b.src", "func f(x: int): int { return x; }\n"),
        ]);
        assert_eq!(got.len(), 1, "{got:?}");
        assert!(got[0].starts_with("b.src:1:6: error[semantic]: duplicate declaration of `f`"));
    }

    #[test]
    fn both_operands_are_checked() {
        let got = messages(&[("a.src", "func f(): int { return a + b; }\n")]);
        assert_eq!(
            got,
            [
                "a.src:1:24: error[semantic]: undeclared identifier `a`",
                "a.src:1:28: error[semantic]: undeclared identifier `b`",
            ]
        );
    }

    #[test]
    fn bad_parameter_type_is_reported_once() {
        let got = messages(&[("p.src", "func f(x: nope): int { return 0; }\n")]);
        assert_eq!(got, ["p.src:1:11: error[semantic]: unknown type `nope`"]);

        let got = messages(&[("p.src", "var v: int;\nfunc g(a: int, y: v): int { return a; }\n")]);
        assert_eq!(got.len(), 1, "{got:?}");
        assert!(got[0].starts_with("p.src:2:19: error[semantic]: `v` is a variable, not a type"));
    }

    #[test]
    fn parameter_types_follow_their_slot() {
        let t = tree("a.src", "type n = float;\nfunc f(a: int, b: n, c: bool): int { return a; }\n");
        let analysis = SemanticAnalyzer::analyze_trees(&[&t]);
        assert!(analysis.is_valid(), "{:?}", analysis.diagnostics);
        let ty = |p: &str| analysis.symbols.local("f", p).unwrap().ty;
        assert_eq!(ty("a"), Some(Type::Int));
        assert_eq!(ty("b"), Some(Type::Float));
        assert_eq!(ty("c"), Some(Type::Bool));
    }

    #[test]
    fn diagnostics_remember_their_file() {
        let a = tree("a.src", "type t = u;\nvar x: int;\n");
        let b = tree("b.src", "type u = t;\nvar x: int;\nfunc f(): int { return y; }\n");
        let analysis = SemanticAnalyzer::analyze_trees(&[&a, &b]);
        assert_eq!(analysis.diagnostics.len(), analysis.origins.len());
        for (d, &origin) in analysis.diagnostics.iter().zip(&analysis.origins) {
            let file = d.file.as_deref().unwrap();
            assert_eq!(file, ["a.src", "b.src"][origin], "{d}");
        }
        assert!(analysis.origins.contains(&0) && analysis.origins.contains(&1));
    }
}

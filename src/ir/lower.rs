// src/ir/lower.rs
// Table-driven lowering of one checked parse tree to three-address code.

use std::sync::Arc;

use super::{
    tables::{GenState, GenerationTable},
    tac::{BinaryOp, Instruction, Op, Operand},
};
use crate::{
    lexer::tokens::{Token, TokenKind},
    parser::{
        tables::{State, TableError},
        tree::{Expr, Function, Item, MalformedTree, Node, ParseTree, Stmt},
    },
    semantic::symbols::SymbolTable,
};

/// Problems with the tables themselves. Any of these aborts the run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{file}:{line}:{column}: generation table has no entry for {kind} in {gen_state:?}")]
    MissingGeneration {
        gen_state: GenState,
        kind: State,
        file: Arc<str>,
        line: u32,
        column: u32,
    },
    #[error("generation for {file} stopped in {gen_state:?} instead of Finished")]
    Unfinished { gen_state: GenState, file: Arc<str> },
    #[error("{file}:{line}:{column}: `{what}` reached lowering unchecked")]
    Unchecked {
        what: String,
        file: Arc<str>,
        line: u32,
        column: u32,
    },
    #[error(transparent)]
    Malformed(#[from] MalformedTree),
    #[error(transparent)]
    Table(#[from] TableError),
}

impl ConfigError {
    fn unchecked(token: &Token) -> Self {
        ConfigError::Unchecked {
            what: token.lexeme.clone(),
            file: token.file.clone(),
            line: token.line,
            column: token.column,
        }
    }
}

#[derive(Default)]
struct Emitter {
    code: Vec<Instruction>,
    next_temp: u32,
}

impl Emitter {
    fn emit(
        &mut self,
        op: Op,
        arg1: Option<Operand>,
        arg2: Option<Operand>,
        result: Option<Operand>,
    ) {
        self.code.push(Instruction::new(op, arg1, arg2, result));
    }

    fn temp(&mut self) -> Operand {
        let t = Operand::Temp(self.next_temp);
        self.next_temp += 1;
        t
    }
}

fn name(token: &Token) -> Operand {
    Operand::Name(token.lexeme.clone())
}

fn value(token: &Token) -> Result<Operand, ConfigError> {
    if token.kind == TokenKind::Ident {
        Ok(name(token))
    } else {
        Operand::literal(token).ok_or_else(|| ConfigError::unchecked(token))
    }
}

pub struct Lowering<'a> {
    table: &'a GenerationTable,
    symbols: &'a SymbolTable,
}

impl<'a> Lowering<'a> {
    pub fn new(table: &'a GenerationTable, symbols: &'a SymbolTable) -> Self {
        Self { table, symbols }
    }

    fn step(&self, gen_state: GenState, node: &Node) -> Result<GenState, ConfigError> {
        self.table.get(gen_state, node.kind()).ok_or_else(|| {
            let t = node.token();
            ConfigError::MissingGeneration {
                gen_state,
                kind: node.kind(),
                file: t.file.clone(),
                line: t.line,
                column: t.column,
            }
        })
    }

    pub fn lower(&self, tree: &ParseTree) -> Result<Vec<Instruction>, ConfigError> {
        let mut out = Emitter::default();
        let mut gen_state = GenState::Initial;

        for item in &tree.items {
            gen_state = self.step(gen_state, item)?;
            match Item::view(item)? {
                Item::Type { .. } | Item::End(_) => {}
                Item::Global { name: n, ty, init } => {
                    let zero = self
                        .symbols
                        .get(&n.lexeme)
                        .and_then(|s| s.ty)
                        .map(Operand::zero)
                        .ok_or_else(|| ConfigError::unchecked(ty))?;
                    let v = match init {
                        Some(lit) => value(lit)?,
                        None => zero,
                    };
                    out.emit(Op::Global, None, None, Some(name(n)));
                    out.emit(Op::Copy, Some(v), None, Some(name(n)));
                }
                Item::Func(f) => gen_state = self.function(item, &f, gen_state, &mut out)?,
            }
            if gen_state == GenState::Finished {
                break;
            }
        }
        if gen_state != GenState::Finished {
            return Err(ConfigError::Unfinished {
                gen_state,
                file: tree.file.clone(),
            });
        }
        log::debug!("[lower] {}: {} instructions", tree.file, out.code.len());
        Ok(out.code)
    }

    fn function(
        &self,
        node: &Node,
        f: &Function<'_>,
        mut gen_state: GenState,
        out: &mut Emitter,
    ) -> Result<GenState, ConfigError> {
        out.next_temp = 0;
        out.emit(
            Op::Func,
            Some(name(f.name)),
            Some(Operand::Int(f.params.len() as u64)),
            None,
        );
        for child in node.children().iter().filter(|c| c.is_construct()) {
            gen_state = self.step(gen_state, child)?;
            match child.kind() {
                State::ParamName => out.emit(Op::ParamIn, None, None, Some(name(child.token()))),
                State::BodyClose => {}
                _ => self.statement(f, Stmt::view(child)?, out)?,
            }
        }
        out.emit(Op::EndFunc, Some(name(f.name)), None, None);
        Ok(gen_state)
    }

    fn statement(
        &self,
        f: &Function<'_>,
        stmt: Stmt<'_>,
        out: &mut Emitter,
    ) -> Result<(), ConfigError> {
        match stmt {
            Stmt::Local { name: n, init, .. } => match init {
                Some(e) => self.expr_into(&e, name(n), out)?,
                None => {
                    let zero = self
                        .symbols
                        .local(&f.name.lexeme, &n.lexeme)
                        .and_then(|s| s.ty)
                        .map(Operand::zero)
                        .ok_or_else(|| ConfigError::unchecked(n))?;
                    out.emit(Op::Copy, Some(zero), None, Some(name(n)));
                }
            },
            Stmt::Assign { target, value } => self.expr_into(&value, name(target), out)?,
            Stmt::Call { callee, args } => self.call(callee, &args, None, out)?,
            Stmt::Return { value: v, .. } => {
                let op = self.expr(&v, out)?;
                out.emit(Op::Return, Some(op), None, None);
            }
        }
        Ok(())
    }

    /// Lowers `e` so its value lands in `dest`.
    fn expr_into(&self, e: &Expr<'_>, dest: Operand, out: &mut Emitter) -> Result<(), ConfigError> {
        match e {
            Expr::Literal(t) | Expr::Name(t) => {
                out.emit(Op::Copy, Some(value(t)?), None, Some(dest));
            }
            Expr::Call { callee, args } => self.call(callee, args, Some(dest), out)?,
            Expr::Binary { op, lhs, rhs } => {
                let l = self.expr(lhs, out)?;
                let r = self.expr(rhs, out)?;
                let bin = BinaryOp::from_token(op.kind).ok_or_else(|| ConfigError::unchecked(op))?;
                out.emit(Op::Binary(bin), Some(l), Some(r), Some(dest));
            }
        }
        Ok(())
    }

    /// Lowers `e` to an operand, spilling compound values into temporaries.
    fn expr(&self, e: &Expr<'_>, out: &mut Emitter) -> Result<Operand, ConfigError> {
        match e {
            Expr::Literal(t) | Expr::Name(t) => value(t),
            _ => {
                let t = out.temp();
                self.expr_into(e, t.clone(), out)?;
                Ok(t)
            }
        }
    }

    fn call(
        &self,
        callee: &Token,
        args: &[&Token],
        dest: Option<Operand>,
        out: &mut Emitter,
    ) -> Result<(), ConfigError> {
        for a in args {
            out.emit(Op::Param, Some(value(a)?), None, None);
        }
        let n = Operand::Int(args.len() as u64);
        out.emit(Op::Call, Some(name(callee)), Some(n), dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        ir::tables::build_generation_table,
        lexer::{KeywordDictionary, Lexer, SourceReader},
        parser::{Parser, tables::ERROR, tables::build_transition_table},
        semantic::SemanticAnalyzer,
    };

    fn tree(src: &str) -> ParseTree {
        let dict = KeywordDictionary::with_keywords();
        let reader = SourceReader::new(Cursor::new(src.as_bytes().to_vec()));
        let tokens = Lexer::new(reader, &dict, Arc::from("l.src"))
            .tokenize()
            .unwrap();
        Parser::new(&build_transition_table()).parse(&tokens).unwrap()
    }

    fn lower_text(src: &str) -> Vec<String> {
        let t = tree(src);
        let analysis = SemanticAnalyzer::analyze_trees(&[&t]);
        assert!(analysis.is_valid(), "{:?}", analysis.diagnostics);
        let gen_table = build_generation_table();
        Lowering::new(&gen_table, &analysis.symbols)
            .lower(&t)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn lowers_globals_functions_and_expressions() {
        let src = "type count = int;
var limit: count = 0x10;
var flag: bool;
func add(a: int, b: int): int {
    var s: int = a + b * 2;
    s = s - 1;
    show(s, true);
    return add(s, 1) + limit;
}
func show(x: int, y: bool): int { return x; }
";
        assert_eq!(
            lower_text(src),
            [
                "global limit",
                "limit = 16",
                "global flag",
                "flag = false",
                "func add, 2",
                "param_in a",
                "param_in b",
                "_t0 = b * 2",
                "s = a + _t0",
                "s = s - 1",
                "param s",
                "param true",
                "call show, 2",
                "param s",
                "param 1",
                "_t2 = call add, 2",
                "_t1 = _t2 + limit",
                "return _t1",
                "endfunc add",
                "func show, 2",
                "param_in x",
                "param_in y",
                "return x",
                "endfunc show",
            ]
        );
    }

    #[test]
    fn temporaries_restart_per_function_and_locals_default_to_zero() {
        let src = "func f(): float { var x: float; return x + 1.5 * 2.0; }
func g(): bool { return 1 < 2 or false; }
";
        assert_eq!(
            lower_text(src),
            [
                "func f, 0",
                "x = 0.0",
                "_t1 = 1.5 * 2.0",
                "_t0 = x + _t1",
                "return _t0",
                "endfunc f",
                "func g, 0",
                "_t1 = 1 < 2",
                "_t0 = _t1 or false",
                "return _t0",
                "endfunc g",
            ]
        );
    }

    #[test]
    fn temporaries_never_clobber_user_names() {
        let src = "func f(b: int): int {
    var t0: int = 5;
    var s: int = t0 + b * 2;
    return s;
}
";
        assert_eq!(
            lower_text(src),
            [
                "func f, 1",
                "param_in b",
                "t0 = 5",
                "_t0 = b * 2",
                "s = t0 + _t0",
                "return s",
                "endfunc f",
            ]
        );
    }

    #[test]
    fn missing_generation_entry_is_fatal() {
        let t = tree("var x: int; func f(): int { return x; }");
        let analysis = SemanticAnalyzer::analyze_trees(&[&t]);
        let mut gen_table = build_generation_table();
        gen_table.rows[GenState::Declarations.idx()][State::FuncKw.idx()] = ERROR;
        let err = Lowering::new(&gen_table, &analysis.symbols)
            .lower(&t)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingGeneration {
                gen_state: GenState::Declarations,
                kind: State::FuncKw,
                ..
            }
        ));
    }
}

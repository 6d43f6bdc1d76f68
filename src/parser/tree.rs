// src/parser/tree.rs
// Parse trees and the typed views the later passes read them through.

use std::{fmt, sync::Arc};

use serde::Serialize;

use super::tables::State;
use crate::lexer::tokens::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Node {
    Leaf {
        kind: State,
        token: Token,
    },
    Branch {
        kind: State,
        token: Token,
        children: Vec<Node>,
    },
}

impl Node {
    pub fn kind(&self) -> State {
        match self {
            Node::Leaf { kind, .. } | Node::Branch { kind, .. } => *kind,
        }
    }

    pub fn token(&self) -> &Token {
        match self {
            Node::Leaf { token, .. } | Node::Branch { token, .. } => token,
        }
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Leaf { .. } => &[],
            Node::Branch { children, .. } => children,
        }
    }

    /// Nodes the lowering pass steps on: every branch plus the two
    /// closing leaves.
    pub fn is_construct(&self) -> bool {
        match self {
            Node::Branch { .. } => true,
            Node::Leaf { kind, .. } => matches!(kind, State::BodyClose | State::Finished),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let t = self.token();
        writeln!(
            f,
            "{:indent$}{} {:?} @{}:{}",
            "",
            self.kind(),
            t.lexeme,
            t.line,
            t.column,
            indent = depth * 2
        )?;
        for c in self.children() {
            c.write_indented(f, depth + 1)?;
        }
        Ok(())
    }
}

/// One file's tree. The last item is always the `Finished` leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseTree {
    pub file: Arc<str>,
    pub items: Vec<Node>,
}

impl ParseTree {
    /// Top-level declarations, `Finished` excluded.
    pub fn declarations(&self) -> impl Iterator<Item = &Node> {
        self.items.iter().filter(|n| n.kind() != State::Finished)
    }
}

impl fmt::Display for ParseTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "== {} ==", self.file)?;
        for item in &self.items {
            item.write_indented(f, 0)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{file}:{line}:{column}: malformed {kind} node")]
pub struct MalformedTree {
    pub kind: State,
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl MalformedTree {
    fn at(node: &Node) -> Self {
        let t = node.token();
        Self {
            kind: node.kind(),
            file: t.file.clone(),
            line: t.line,
            column: t.column,
        }
    }
}

// ---------- expressions ----------

#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'t> {
    Literal(&'t Token),
    Name(&'t Token),
    Call {
        callee: &'t Token,
        args: Vec<&'t Token>,
    },
    Binary {
        op: &'t Token,
        lhs: Box<Expr<'t>>,
        rhs: Box<Expr<'t>>,
    },
}

impl<'t> Expr<'t> {
    /// Token that positions diagnostics about this expression.
    pub fn anchor(&self) -> &'t Token {
        match self {
            Expr::Literal(t) | Expr::Name(t) => *t,
            Expr::Call { callee, .. } => *callee,
            Expr::Binary { lhs, .. } => lhs.anchor(),
        }
    }
}

/// Larger binds tighter. All levels are left associative.
pub fn binding_power(op: TokenKind) -> Option<u8> {
    use TokenKind::*;
    Some(match op {
        Or => 1,
        And => 2,
        Lt | Gt | Le | Ge | EqEq | NotEq => 3,
        Plus | Minus => 4,
        Star | Slash | Percent => 5,
        _ => return None,
    })
}

/// Builds an expression tree out of the flat operand/operator run the
/// parser records, applying operator precedence.
pub fn structure_expr<'t>(
    owner: &'t Node,
    nodes: &'t [Node],
) -> Result<Expr<'t>, MalformedTree> {
    let mut pos = 0;
    let expr = climb(owner, nodes, &mut pos, 0)?;
    if pos != nodes.len() {
        return Err(MalformedTree::at(owner));
    }
    Ok(expr)
}

fn climb<'t>(
    owner: &'t Node,
    nodes: &'t [Node],
    pos: &mut usize,
    min: u8,
) -> Result<Expr<'t>, MalformedTree> {
    let mut lhs = operand(owner, nodes.get(*pos))?;
    *pos += 1;
    while let Some(Node::Leaf {
        kind: State::BinOp,
        token,
    }) = nodes.get(*pos)
    {
        let bp = binding_power(token.kind).ok_or_else(|| MalformedTree::at(owner))?;
        if bp < min {
            break;
        }
        *pos += 1;
        let rhs = climb(owner, nodes, pos, bp + 1)?;
        lhs = Expr::Binary {
            op: token,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        };
    }
    Ok(lhs)
}

fn operand<'t>(owner: &'t Node, node: Option<&'t Node>) -> Result<Expr<'t>, MalformedTree> {
    match node {
        Some(Node::Leaf {
            kind: State::Operand,
            token,
        }) => Ok(Expr::Literal(token)),
        Some(Node::Leaf {
            kind: State::OperandName,
            token,
        }) => Ok(Expr::Name(token)),
        Some(call @ Node::Branch {
            kind: State::CallOpen,
            token,
            children,
        }) => {
            let args = children
                .get(1..)
                .ok_or_else(|| MalformedTree::at(call))?
                .iter()
                .map(|a| leaf(call, Some(a), State::CallArg))
                .collect::<Result<_, _>>()?;
            Ok(Expr::Call {
                callee: token,
                args,
            })
        }
        Some(other) => Err(MalformedTree::at(other)),
        None => Err(MalformedTree::at(owner)),
    }
}

fn leaf<'t>(
    owner: &'t Node,
    node: Option<&'t Node>,
    want: State,
) -> Result<&'t Token, MalformedTree> {
    match node {
        Some(Node::Leaf { kind, token }) if *kind == want => Ok(token),
        _ => Err(MalformedTree::at(owner)),
    }
}

// ---------- declarations and statements ----------

#[derive(Debug, Clone, PartialEq)]
pub struct Param<'t> {
    pub name: &'t Token,
    pub ty: &'t Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function<'t> {
    pub name: &'t Token,
    pub params: Vec<Param<'t>>,
    pub ret: &'t Token,
    /// Statement nodes, in order.
    pub body: &'t [Node],
    pub close: &'t Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item<'t> {
    Type {
        name: &'t Token,
        target: &'t Token,
    },
    Global {
        name: &'t Token,
        ty: &'t Token,
        init: Option<&'t Token>,
    },
    Func(Function<'t>),
    End(&'t Token),
}

impl<'t> Item<'t> {
    pub fn view(node: &'t Node) -> Result<Self, MalformedTree> {
        let c = node.children();
        match node.kind() {
            State::TypeKw if c.len() == 2 => Ok(Item::Type {
                name: leaf(node, c.first(), State::TypeName)?,
                target: leaf(node, c.get(1), State::TypeTarget)?,
            }),
            State::GlobalKw if matches!(c.len(), 2 | 3) => Ok(Item::Global {
                name: leaf(node, c.first(), State::GlobalName)?,
                ty: leaf(node, c.get(1), State::GlobalType)?,
                init: c
                    .get(2)
                    .map(|n| leaf(node, Some(n), State::GlobalInit))
                    .transpose()?,
            }),
            State::FuncKw => Function::view(node).map(Item::Func),
            State::Finished => Ok(Item::End(node.token())),
            _ => Err(MalformedTree::at(node)),
        }
    }
}

impl<'t> Function<'t> {
    fn view(node: &'t Node) -> Result<Self, MalformedTree> {
        let c = node.children();
        let name = leaf(node, c.first(), State::FuncName)?;
        let mut i = 1;
        let mut params = Vec::new();
        while let Some(p @ Node::Branch {
            kind: State::ParamName,
            children,
            ..
        }) = c.get(i)
        {
            params.push(Param {
                name: leaf(p, children.first(), State::ParamName)?,
                ty: leaf(p, children.get(1), State::ParamType)?,
            });
            i += 1;
        }
        let ret = leaf(node, c.get(i), State::RetType)?;
        let close = leaf(node, c.last(), State::BodyClose)?;
        let body = c.get(i + 1..c.len() - 1).ok_or_else(|| MalformedTree::at(node))?;
        Ok(Self {
            name,
            params,
            ret,
            body,
            close,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'t> {
    Local {
        name: &'t Token,
        ty: &'t Token,
        init: Option<Expr<'t>>,
    },
    Assign {
        target: &'t Token,
        value: Expr<'t>,
    },
    Call {
        callee: &'t Token,
        args: Vec<&'t Token>,
    },
    Return {
        keyword: &'t Token,
        value: Expr<'t>,
    },
}

impl<'t> Stmt<'t> {
    pub fn view(node: &'t Node) -> Result<Self, MalformedTree> {
        let c = node.children();
        match node.kind() {
            State::LocalKw => {
                let name = leaf(node, c.first(), State::LocalName)?;
                let ty = leaf(node, c.get(1), State::LocalType)?;
                let rest = c.get(2..).unwrap_or_default();
                let init = if rest.is_empty() {
                    None
                } else {
                    Some(structure_expr(node, rest)?)
                };
                Ok(Stmt::Local { name, ty, init })
            }
            State::AssignEq => Ok(Stmt::Assign {
                target: leaf(node, c.first(), State::StmtName)?,
                value: structure_expr(node, c.get(1..).unwrap_or_default())?,
            }),
            State::CallStmt => Ok(Stmt::Call {
                callee: leaf(node, c.first(), State::StmtName)?,
                args: c
                    .get(1..)
                    .unwrap_or_default()
                    .iter()
                    .map(|a| leaf(node, Some(a), State::CallStmtArg))
                    .collect::<Result<_, _>>()?,
            }),
            State::ReturnKw => Ok(Stmt::Return {
                keyword: node.token(),
                value: structure_expr(node, c)?,
            }),
            _ => Err(MalformedTree::at(node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text, Arc::from("t.src"), 1, 1)
    }

    fn leaf_node(kind: State, tk: TokenKind, text: &str) -> Node {
        Node::Leaf {
            kind,
            token: tok(tk, text),
        }
    }

    fn render(e: &Expr) -> String {
        match e {
            Expr::Literal(t) | Expr::Name(t) => t.lexeme.clone(),
            Expr::Call { callee, args } => {
                let a: Vec<_> = args.iter().map(|t| t.lexeme.as_str()).collect();
                format!("{}({})", callee.lexeme, a.join(","))
            }
            Expr::Binary { op, lhs, rhs } => {
                format!("({} {} {})", render(lhs), op.lexeme, render(rhs))
            }
        }
    }

    fn flat(parts: &[(&str, TokenKind)]) -> Vec<Node> {
        parts
            .iter()
            .map(|&(text, kind)| match kind {
                TokenKind::Ident => leaf_node(State::OperandName, kind, text),
                TokenKind::Number => leaf_node(State::Operand, kind, text),
                _ => leaf_node(State::BinOp, kind, text),
            })
            .collect()
    }

    #[test]
    fn precedence_and_left_associativity() {
        use TokenKind::*;
        let owner = leaf_node(State::ReturnKw, Return, "return");
        let nodes = flat(&[
            ("a", Ident),
            ("+", Plus),
            ("b", Ident),
            ("*", Star),
            ("2", Number),
            ("-", Minus),
            ("c", Ident),
        ]);
        let e = structure_expr(&owner, &nodes).unwrap();
        assert_eq!(render(&e), "((a + (b * 2)) - c)");

        let nodes = flat(&[
            ("x", Ident),
            ("<", Lt),
            ("1", Number),
            ("or", Or),
            ("y", Ident),
            ("and", And),
            ("z", Ident),
        ]);
        let e = structure_expr(&owner, &nodes).unwrap();
        assert_eq!(render(&e), "((x < 1) or (y and z))");
    }

    #[test]
    fn dangling_operator_is_malformed() {
        use TokenKind::*;
        let owner = leaf_node(State::ReturnKw, Return, "return");
        let nodes = flat(&[("a", Ident), ("+", Plus)]);
        let err = structure_expr(&owner, &nodes).unwrap_err();
        assert_eq!(err.kind, State::ReturnKw);
        assert!(structure_expr(&owner, &[]).is_err());
    }
}

// src/parser/driver.rs
// Table-driven parser: one table lookup per token, tree built by the action
// attached to each state entered.

use std::sync::Arc;

use super::{
    tables::{Action, State, TransitionTable},
    tree::{Node, ParseTree},
};
use crate::lexer::tokens::{Token, TokenKind};

fn join_kinds(kinds: &[TokenKind]) -> String {
    match kinds {
        [] => "nothing".to_string(),
        [one] => one.to_string(),
        _ => {
            let parts: Vec<String> = kinds.iter().map(|k| k.to_string()).collect();
            format!("one of {}", parts.join(", "))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyntaxError {
    #[error("{file}:{line}:{column}: unexpected {found}, expected {}", join_kinds(.expected))]
    Unexpected {
        file: Arc<str>,
        line: u32,
        column: u32,
        found: TokenKind,
        expected: Vec<TokenKind>,
    },
    #[error("{file}: input ended before the end-of-file token")]
    UnexpectedEnd { file: Arc<str> },
    #[error("{file}:{line}:{column}: entering {state} leaves the tree inconsistent")]
    Inconsistent {
        state: State,
        file: Arc<str>,
        line: u32,
        column: u32,
    },
}

impl SyntaxError {
    /// The message without its location prefix.
    pub fn detail(&self) -> String {
        match self {
            SyntaxError::Unexpected {
                found, expected, ..
            } => format!("unexpected {found}, expected {}", join_kinds(expected)),
            SyntaxError::UnexpectedEnd { .. } => "input ended before the end-of-file token".into(),
            SyntaxError::Inconsistent { state, .. } => {
                format!("entering {state} leaves the tree inconsistent")
            }
        }
    }

    pub fn position(&self) -> Option<(u32, u32)> {
        match self {
            SyntaxError::Unexpected { line, column, .. }
            | SyntaxError::Inconsistent { line, column, .. } => Some((*line, *column)),
            SyntaxError::UnexpectedEnd { .. } => None,
        }
    }
}

struct Mark {
    start: usize,
    kind: State,
    token: Token,
}

/// Stack machine the state actions drive.
#[derive(Default)]
struct TreeBuilder {
    /// leaves and folded operands of the constructs still open
    pending: Vec<Node>,
    marks: Vec<Mark>,
    /// open function bodies
    blocks: Vec<Node>,
    items: Vec<Node>,
}

impl TreeBuilder {
    fn enter(&mut self, state: State, tok: &Token) -> Option<()> {
        match state.action() {
            Action::Skip => {}
            Action::Shift => self.shift(state, tok),
            Action::Begin => self.begin(state, tok.clone(), self.pending.len()),
            Action::BeginShift => {
                self.begin(state, tok.clone(), self.pending.len());
                self.shift(state, tok);
            }
            Action::Wrap => {
                let start = self.pending.len().checked_sub(1)?;
                let callee = self.pending[start].token().clone();
                self.begin(state, callee, start);
            }
            Action::Retag => self.marks.last_mut()?.kind = state,
            Action::Fold => {
                let node = self.close()?;
                self.pending.push(node);
            }
            Action::Reduce => {
                let node = self.close()?;
                self.attach(node);
            }
            Action::Open => {
                let node = self.close()?;
                self.blocks.push(node);
            }
            Action::Close => {
                let mut block = self.blocks.pop()?;
                let Node::Branch { children, .. } = &mut block else {
                    return None;
                };
                children.push(Node::Leaf {
                    kind: state,
                    token: tok.clone(),
                });
                self.attach(block);
            }
            Action::Finish => self.items.push(Node::Leaf {
                kind: state,
                token: tok.clone(),
            }),
        }
        Some(())
    }

    fn shift(&mut self, state: State, tok: &Token) {
        self.pending.push(Node::Leaf {
            kind: state,
            token: tok.clone(),
        });
    }

    fn begin(&mut self, kind: State, token: Token, start: usize) {
        self.marks.push(Mark { start, kind, token });
    }

    fn close(&mut self) -> Option<Node> {
        let mark = self.marks.pop()?;
        if mark.start > self.pending.len() {
            return None;
        }
        let children = self.pending.split_off(mark.start);
        Some(Node::Branch {
            kind: mark.kind,
            token: mark.token,
            children,
        })
    }

    fn attach(&mut self, node: Node) {
        match self.blocks.last_mut() {
            Some(Node::Branch { children, .. }) => children.push(node),
            _ => self.items.push(node),
        }
    }

    fn is_settled(&self) -> bool {
        self.pending.is_empty() && self.marks.is_empty() && self.blocks.is_empty()
    }
}

pub struct Parser<'t> {
    table: &'t TransitionTable,
}

impl<'t> Parser<'t> {
    pub fn new(table: &'t TransitionTable) -> Self {
        Self { table }
    }

    /// Parses one file's tokens. The same tokens always give the same tree.
    pub fn parse(&self, tokens: &[Token]) -> Result<ParseTree, SyntaxError> {
        let file: Arc<str> = tokens
            .first()
            .map(|t| t.file.clone())
            .unwrap_or_else(|| Arc::from(""));
        let mut state = State::Start;
        let mut builder = TreeBuilder::default();

        for tok in tokens {
            let Some(next) = self.table.get(state, tok.kind) else {
                return Err(SyntaxError::Unexpected {
                    file,
                    line: tok.line,
                    column: tok.column,
                    found: tok.kind,
                    expected: self.table.expected(state),
                });
            };
            let inconsistent = || SyntaxError::Inconsistent {
                state: next,
                file: file.clone(),
                line: tok.line,
                column: tok.column,
            };
            builder.enter(next, tok).ok_or_else(inconsistent)?;
            state = next;
            if state == State::Finished {
                if !builder.is_settled() {
                    return Err(inconsistent());
                }
                log::debug!("[parser] {file}: {} items", builder.items.len());
                return Ok(ParseTree {
                    file,
                    items: builder.items,
                });
            }
        }
        Err(SyntaxError::UnexpectedEnd { file })
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::{
        lexer::{KeywordDictionary, Lexer, SourceReader},
        parser::{
            tables::build_transition_table,
            tree::{Expr, Item, Stmt},
        },
    };

    fn tokens(src: &str) -> Vec<Token> {
        let dict = KeywordDictionary::with_keywords();
        let reader = SourceReader::new(Cursor::new(src.as_bytes().to_vec()));
        Lexer::new(reader, &dict, Arc::from("p.src"))
            .tokenize()
            .unwrap()
    }

    fn parse(src: &str) -> Result<ParseTree, SyntaxError> {
        let table = build_transition_table();
        Parser::new(&table).parse(&tokens(src))
    }

    const PROGRAM: &str = "type count = int;
var limit: count = 0x10;
func add(a: int, b: int): int {
    var s: int = a + b * 2;
    s = s - 1;
    show(s, true);
    return add(s, 1) + limit;
}
";

    #[test]
    fn builds_items_in_source_order() {
        let tree = parse(PROGRAM).unwrap();
        let kinds: Vec<State> = tree.items.iter().map(Node::kind).collect();
        assert_eq!(
            kinds,
            [State::TypeKw, State::GlobalKw, State::FuncKw, State::Finished]
        );
        assert_eq!(tree.file.as_ref(), "p.src");
    }

    #[test]
    fn function_view_exposes_params_and_statements() {
        let tree = parse(PROGRAM).unwrap();
        let Item::Func(f) = Item::view(&tree.items[2]).unwrap() else {
            panic!("expected a function");
        };
        assert_eq!(f.name.lexeme, "add");
        let params: Vec<(&str, &str)> = f
            .params
            .iter()
            .map(|p| (p.name.lexeme.as_str(), p.ty.lexeme.as_str()))
            .collect();
        assert_eq!(params, [("a", "int"), ("b", "int")]);
        assert_eq!(f.ret.lexeme, "int");
        assert_eq!(f.body.len(), 4);
        assert_eq!((f.close.line, f.close.column), (8, 1));

        let stmts: Vec<Stmt> = f.body.iter().map(|n| Stmt::view(n).unwrap()).collect();
        assert!(matches!(&stmts[0], Stmt::Local { init: Some(Expr::Binary { .. }), .. }));
        assert!(matches!(&stmts[1], Stmt::Assign { target, .. } if target.lexeme == "s"));
        assert!(matches!(&stmts[2], Stmt::Call { args, .. } if args.len() == 2));
        let Stmt::Return { value, .. } = &stmts[3] else {
            panic!("expected a return");
        };
        let Expr::Binary { lhs, .. } = value else {
            panic!("expected a binary return value");
        };
        assert!(matches!(lhs.as_ref(), Expr::Call { callee, args } if callee.lexeme == "add" && args.len() == 2));
    }

    #[test]
    fn parsing_is_deterministic() {
        let toks = tokens(PROGRAM);
        let table = build_transition_table();
        let parser = Parser::new(&table);
        assert_eq!(parser.parse(&toks).unwrap(), parser.parse(&toks).unwrap());
    }

    #[test]
    fn empty_file_is_just_finished() {
        let tree = parse("").unwrap();
        assert_eq!(tree.items.len(), 1);
        assert_eq!(tree.items[0].kind(), State::Finished);
    }

    #[test]
    fn unexpected_token_reports_position_and_expectations() {
        let err = parse("var x int;").unwrap_err();
        let SyntaxError::Unexpected {
            line,
            column,
            found,
            ref expected,
            ..
        } = err
        else {
            panic!("expected Unexpected, got {err:?}");
        };
        assert_eq!((line, column), (1, 7));
        assert_eq!(found, TokenKind::Int);
        assert_eq!(expected, &[TokenKind::Colon]);
        assert_eq!(err.to_string(), "p.src:1:7: unexpected `int`, expected `:`");
    }

    #[test]
    fn statements_outside_functions_are_rejected() {
        let err = parse("x = 1;").unwrap_err();
        assert_eq!(err.position(), Some((1, 1)));
        let err = parse("func f(): int { return 1; ").unwrap_err();
        assert!(matches!(err, SyntaxError::Unexpected { found: TokenKind::Eof, .. }));
    }

    #[test]
    fn unexpected_end_points_past_trailing_lines() {
        let err = parse("var x: int;\nfunc f(): int {\n  return 1;\n\n").unwrap_err();
        assert!(matches!(err, SyntaxError::Unexpected { found: TokenKind::Eof, .. }));
        assert_eq!(err.position(), Some((5, 1)));
    }

    #[test]
    fn missing_eof_token_is_unexpected_end() {
        let mut toks = tokens("var x: int;");
        toks.pop();
        let table = build_transition_table();
        let err = Parser::new(&table).parse(&toks).unwrap_err();
        assert!(matches!(err, SyntaxError::UnexpectedEnd { .. }));
    }
}

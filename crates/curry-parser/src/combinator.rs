//! Deterministic LL(1) parser combinators.
//!
//! A `Parser<A>` is a *value*, not an opaque closure: it consists of an
//! optional ε-action and a lookahead table mapping token categories to
//! actions. Because first-sets are inspectable, combining two parsers with
//! [`Parser::or`] checks at construction time that their first-sets are
//! disjoint and that at most one of them accepts the empty sequence;
//! violating either is a programmer error and panics.
//!
//! Construction is lazy: every combinator returns a thunk that is forced the
//! first time the parser (or a parser containing it) is used, so mutually
//! recursive grammars can tie the knot with [`Parser::recursive`]. Forcing a
//! parser while it is being forced means the grammar is left-recursive,
//! which also panics.
//!
//! For the few places where a grammar is genuinely not LL(1) there is
//! [`Parser::or_longest`]: both branches run on a snapshot of the cursor,
//! the branch that consumed more input wins, success beats failure on ties,
//! and a success/success tie at the same position is an ambiguity error.
//!
//! The parser and the lexer share the layout context stack: the combinators
//! [`layout_on`], [`layout_off`] and [`layout_end`] consume no input and
//! manipulate the stack inside the [`Cursor`], which the lexer consults when
//! it crosses a line boundary. [`layout`] wraps a block body in either an
//! explicit-brace context or an implicit one closed by a virtual brace.

use curry_diagnostics::{ParseError, Position, SyntaxError};
use curry_lexer::{Category, Lexer, Token, NO_LAYOUT};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::rc::Rc;

pub type ParseResult<A> = Result<A, SyntaxError>;

// ============================================================================
// Cursor
// ============================================================================

/// A token cursor over the streaming lexer, with one token of lookahead.
///
/// The lookahead is cut lazily so that layout-context pushes take effect
/// before the following token is lexed. A cursor snapshot is a cheap clone;
/// `or_longest` relies on this.
#[derive(Clone)]
pub struct Cursor {
    lexer: Lexer,
    lookahead: Option<Token>,
}

impl Cursor {
    #[must_use]
    pub fn new(lexer: Lexer) -> Self {
        Self { lexer, lookahead: None }
    }

    /// The next token without consuming it.
    pub fn peek(&mut self) -> ParseResult<&Token> {
        if self.lookahead.is_none() {
            let token = self.lexer.next_token()?;
            self.lookahead = Some(token);
        }
        Ok(self.lookahead.as_ref().expect("lookahead was just filled"))
    }

    /// Consume and return the next token.
    pub fn bump(&mut self) -> ParseResult<Token> {
        self.peek()?;
        Ok(self.lookahead.take().expect("lookahead was just filled"))
    }

    /// The position of the next token.
    pub fn position(&mut self) -> ParseResult<Position> {
        Ok(self.peek()?.position.clone())
    }

    /// Push a layout context at the column of the next token.
    pub fn open_context(&mut self) -> ParseResult<()> {
        let column = self.peek()?.position.column().unwrap_or(0) as i32;
        self.lexer.push_context(column);
        Ok(())
    }

    /// Push the explicit-brace sentinel.
    pub fn open_explicit_context(&mut self) {
        self.lexer.push_context(NO_LAYOUT);
    }

    /// Pop one layout context.
    pub fn close_context(&mut self) {
        self.lexer.pop_context();
    }

    /// The number of open layout contexts.
    #[must_use]
    pub fn context_depth(&self) -> usize {
        self.lexer.context_depth()
    }

    /// Bytes consumed so far; used to compare branch progress.
    #[must_use]
    pub fn offset(&self) -> usize {
        match &self.lookahead {
            Some(token) => token.span.start as usize,
            None => self.lexer.offset(),
        }
    }
}

// ============================================================================
// Parser representation
// ============================================================================

type Action<A> = Rc<dyn Fn(&mut Cursor) -> ParseResult<A>>;

struct Table<A> {
    /// Fires when no lookahead entry matches; consumes no token on entry.
    empty: Option<Action<A>>,
    /// Lookahead actions; each consumes the matched token itself.
    alts: FxHashMap<Category, Action<A>>,
    /// Custom "<label> expected" message, set by [`Parser::labelled`].
    label: Option<String>,
}

impl<A> Clone for Table<A> {
    fn clone(&self) -> Self {
        Self {
            empty: self.empty.clone(),
            alts: self.alts.clone(),
            label: self.label.clone(),
        }
    }
}

enum Node<A: 'static> {
    Ready(Rc<Table<A>>),
    Thunk(Box<dyn FnOnce() -> Table<A>>),
    /// Placeholder handed out by [`Parser::recursive`] before the knot is tied.
    Declared,
    /// Tied knot of a recursive definition.
    Link(Parser<A>),
    /// Marker while a thunk is being forced; hitting it means left recursion.
    Forcing,
}

pub struct Parser<A: 'static> {
    node: Rc<RefCell<Node<A>>>,
}

impl<A> Clone for Parser<A> {
    fn clone(&self) -> Self {
        Self { node: Rc::clone(&self.node) }
    }
}

enum Step<A: 'static> {
    Done(Rc<Table<A>>),
    Follow(Parser<A>),
    Force(Box<dyn FnOnce() -> Table<A>>),
}

impl<A: 'static> Parser<A> {
    fn from_table(table: Table<A>) -> Self {
        Self { node: Rc::new(RefCell::new(Node::Ready(Rc::new(table)))) }
    }

    fn from_thunk(f: impl FnOnce() -> Table<A> + 'static) -> Self {
        Self { node: Rc::new(RefCell::new(Node::Thunk(Box::new(f)))) }
    }

    fn table(&self) -> Rc<Table<A>> {
        let step = {
            let mut node = self.node.borrow_mut();
            match &*node {
                Node::Ready(table) => Step::Done(Rc::clone(table)),
                Node::Link(parser) => Step::Follow(parser.clone()),
                Node::Forcing => panic!("invariant violation: left-recursive parser definition"),
                Node::Declared => {
                    panic!("invariant violation: recursive parser used during its own construction")
                }
                Node::Thunk(_) => match std::mem::replace(&mut *node, Node::Forcing) {
                    Node::Thunk(f) => Step::Force(f),
                    _ => unreachable!(),
                },
            }
        };
        match step {
            Step::Done(table) => table,
            Step::Follow(parser) => parser.table(),
            Step::Force(f) => {
                let table = Rc::new(f());
                *self.node.borrow_mut() = Node::Ready(Rc::clone(&table));
                table
            }
        }
    }

    /// The first-set of this parser.
    #[must_use]
    pub fn first_set(&self) -> Vec<Category> {
        let table = self.table();
        let mut keys: Vec<Category> = table.alts.keys().copied().collect();
        keys.sort();
        keys
    }

    /// Whether this parser accepts the empty sequence.
    #[must_use]
    pub fn accepts_empty(&self) -> bool {
        self.table().empty.is_some()
    }

    /// Run this parser at the cursor's current lookahead.
    pub fn run(&self, cursor: &mut Cursor) -> ParseResult<A> {
        let table = self.table();
        let category = cursor.peek()?.category();
        if let Some(action) = table.alts.get(&category) {
            let action = Rc::clone(action);
            return action(cursor);
        }
        if let Some(action) = &table.empty {
            let action = Rc::clone(action);
            return action(cursor);
        }

        let token = cursor.peek()?;
        let error = match &table.label {
            Some(label) => ParseError::Expected {
                label: label.clone(),
                position: token.position.clone(),
                span: token.span.into(),
            },
            None => {
                let mut expected: Vec<String> =
                    table.alts.keys().map(|k| k.name().to_string()).collect();
                expected.sort();
                ParseError::UnexpectedToken {
                    found: token.kind.name().to_string(),
                    expected,
                    position: token.position.clone(),
                    span: token.span.into(),
                }
            }
        };
        Err(error.into())
    }

    /// Tie the knot of a recursive grammar. The closure receives a handle to
    /// the parser being defined; using the handle's first-set inside the
    /// closure (left recursion) panics.
    pub fn recursive(f: impl FnOnce(Parser<A>) -> Parser<A>) -> Self {
        let declared = Parser { node: Rc::new(RefCell::new(Node::Declared)) };
        let built = f(declared.clone());
        *declared.node.borrow_mut() = Node::Link(built);
        declared
    }

    // ========================================================================
    // Basic combinators
    // ========================================================================

    /// The parser that consumes nothing and produces `f()`.
    pub fn pure_with(f: impl Fn() -> A + 'static) -> Self {
        Self::from_table(Table {
            empty: Some(Rc::new(move |_| Ok(f()))),
            alts: FxHashMap::default(),
            label: None,
        })
    }

    pub fn map<B: 'static>(self, f: impl Fn(A) -> B + 'static) -> Parser<B> {
        let f = Rc::new(f);
        Parser::from_thunk(move || {
            let table = self.table();
            let map_action = |action: &Action<A>| -> Action<B> {
                let action = Rc::clone(action);
                let f = Rc::clone(&f);
                Rc::new(move |cursor| action(cursor).map(|a| f(a)))
            };
            Table {
                empty: table.empty.as_ref().map(&map_action),
                alts: table.alts.iter().map(|(k, a)| (*k, map_action(a))).collect(),
                label: table.label.clone(),
            }
        })
    }

    /// Like `map`, but the function may reject the parse with an error.
    pub fn try_map<B: 'static>(
        self,
        f: impl Fn(A) -> Result<B, ParseError> + 'static,
    ) -> Parser<B> {
        let f = Rc::new(f);
        Parser::from_thunk(move || {
            let table = self.table();
            let map_action = |action: &Action<A>| -> Action<B> {
                let action = Rc::clone(action);
                let f = Rc::clone(&f);
                Rc::new(move |cursor| f(action(cursor)?).map_err(SyntaxError::from))
            };
            Table {
                empty: table.empty.as_ref().map(&map_action),
                alts: table.alts.iter().map(|(k, a)| (*k, map_action(a))).collect(),
                label: table.label.clone(),
            }
        })
    }

    /// Sequence two parsers. If the first can match ε, lookahead tokens that
    /// begin the first parser take precedence over the second's.
    pub fn then<B: 'static>(self, other: Parser<B>) -> Parser<(A, B)> {
        Parser::from_thunk(move || {
            let ta = self.table();
            let mut alts: FxHashMap<Category, Action<(A, B)>> = FxHashMap::default();
            for (key, action) in ta.alts.iter() {
                let action = Rc::clone(action);
                let other = other.clone();
                alts.insert(
                    *key,
                    Rc::new(move |cursor| {
                        let a = action(cursor)?;
                        let b = other.run(cursor)?;
                        Ok((a, b))
                    }),
                );
            }

            let empty = match &ta.empty {
                None => None,
                Some(empty_a) => {
                    let tb = other.table();
                    for (key, action_b) in tb.alts.iter() {
                        if alts.contains_key(key) {
                            continue;
                        }
                        let empty_a = Rc::clone(empty_a);
                        let action_b = Rc::clone(action_b);
                        alts.insert(
                            *key,
                            Rc::new(move |cursor| {
                                let a = empty_a(cursor)?;
                                let b = action_b(cursor)?;
                                Ok((a, b))
                            }),
                        );
                    }
                    tb.empty.as_ref().map(|empty_b| {
                        let empty_a = Rc::clone(empty_a);
                        let empty_b = Rc::clone(empty_b);
                        Rc::new(move |cursor: &mut Cursor| {
                            let a = empty_a(cursor)?;
                            let b = empty_b(cursor)?;
                            Ok((a, b))
                        }) as Action<(A, B)>
                    })
                }
            };

            Table { empty, alts, label: None }
        })
    }

    pub fn ignore_then<B: 'static>(self, other: Parser<B>) -> Parser<B> {
        self.then(other).map(|(_, b)| b)
    }

    pub fn then_ignore<B: 'static>(self, other: Parser<B>) -> Parser<A> {
        self.then(other).map(|(a, _)| a)
    }

    /// Deterministic choice. The two first-sets must be disjoint and at most
    /// one alternative may accept ε; a violation is a programmer error.
    pub fn or(self, other: Parser<A>) -> Parser<A> {
        Parser::from_thunk(move || {
            let ta = self.table();
            let tb = other.table();
            let mut alts = ta.alts.clone();
            for (key, action) in tb.alts.iter() {
                if alts.insert(*key, Rc::clone(action)).is_some() {
                    panic!(
                        "invariant violation: parser alternatives overlap on '{}' \
                         (use or_longest or restrict)",
                        key.name()
                    );
                }
            }
            let empty = match (&ta.empty, &tb.empty) {
                (Some(_), Some(_)) => {
                    panic!("invariant violation: both parser alternatives accept the empty sequence")
                }
                (Some(e), None) | (None, Some(e)) => Some(Rc::clone(e)),
                (None, None) => None,
            };
            Table { empty, alts, label: ta.label.clone().or_else(|| tb.label.clone()) }
        })
    }

    /// Non-deterministic choice for first-set overlaps: both branches run on
    /// a cursor snapshot, the branch that consumed more input wins, success
    /// beats failure on ties, and a success/success tie at the same position
    /// is an ambiguity error at that position.
    pub fn or_longest(self, other: Parser<A>) -> Parser<A> {
        Parser::from_thunk(move || {
            let ta = self.table();
            let tb = other.table();
            if ta.empty.is_some() && tb.empty.is_some() {
                panic!("invariant violation: both or_longest alternatives accept the empty sequence");
            }

            let mut alts: FxHashMap<Category, Action<A>> = FxHashMap::default();
            let mut keys: Vec<Category> = ta.alts.keys().chain(tb.alts.keys()).copied().collect();
            keys.sort();
            keys.dedup();

            for key in keys {
                // A branch can also start via its ε-action when the token is
                // only in the other branch's first-set.
                let branch_a = ta.alts.get(&key).or(ta.empty.as_ref()).map(Rc::clone);
                let branch_b = tb.alts.get(&key).or(tb.empty.as_ref()).map(Rc::clone);
                let action: Action<A> = match (branch_a, branch_b) {
                    (Some(a), Some(b)) => Rc::new(move |cursor| race(cursor, &a, &b)),
                    (Some(a), None) => a,
                    (None, Some(b)) => b,
                    (None, None) => unreachable!(),
                };
                alts.insert(key, action);
            }

            let empty = ta.empty.clone().or_else(|| tb.empty.clone());
            Table { empty, alts, label: None }
        })
    }

    /// Remove the given keys from this parser's lookahead table. Used to
    /// resolve first-set overlaps without a non-deterministic choice.
    pub fn restrict(self, keys: &[Category]) -> Parser<A> {
        let keys = keys.to_vec();
        Parser::from_thunk(move || {
            let table = self.table();
            let mut result = (*table).clone();
            for key in &keys {
                result.alts.remove(key);
            }
            result
        })
    }

    /// Replace the "unexpected token" error with "`label` expected".
    pub fn labelled(self, label: impl Into<String>) -> Parser<A> {
        let label = label.into();
        Parser::from_thunk(move || {
            let mut table = (*self.table()).clone();
            table.label = Some(label);
            table
        })
    }

    // ========================================================================
    // Repetition
    // ========================================================================

    /// Zero or more occurrences. The parser must not accept ε.
    pub fn repeated(self) -> Parser<Vec<A>> {
        let some = self.at_least_one();
        Parser::from_thunk(move || {
            let table = some.table();
            Table {
                empty: Some(Rc::new(|_| Ok(Vec::new()))),
                alts: table.alts.clone(),
                label: None,
            }
        })
    }

    /// One or more occurrences. The parser must not accept ε.
    pub fn at_least_one(self) -> Parser<Vec<A>> {
        Parser::from_thunk(move || {
            let table = self.table();
            if table.empty.is_some() {
                panic!("invariant violation: repeated parser must consume input");
            }
            let mut alts: FxHashMap<Category, Action<Vec<A>>> = FxHashMap::default();
            for (key, action) in table.alts.iter() {
                let action = Rc::clone(action);
                let item = self.clone();
                alts.insert(
                    *key,
                    Rc::new(move |cursor| {
                        let mut items = vec![action(cursor)?];
                        loop {
                            let category = cursor.peek()?.category();
                            if !item.table().alts.contains_key(&category) {
                                return Ok(items);
                            }
                            items.push(item.run(cursor)?);
                        }
                    }),
                );
            }
            Table { empty: None, alts, label: table.label.clone() }
        })
    }

    /// One or more occurrences separated by `separator`.
    pub fn separated_by1<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<A>> {
        self.clone()
            .then(separator.ignore_then(self).repeated())
            .map(|(first, mut rest)| {
                let mut items = Vec::with_capacity(rest.len() + 1);
                items.push(first);
                items.append(&mut rest);
                items
            })
    }

    /// Zero or more occurrences separated by `separator`.
    pub fn separated_by<S: 'static>(self, separator: Parser<S>) -> Parser<Vec<A>> {
        self.separated_by1(separator).or(Parser::pure_with(Vec::new))
    }

    /// Zero or one occurrence.
    pub fn or_not(self) -> Parser<Option<A>> {
        self.map(Some).or(Parser::pure_with(|| None))
    }
}

/// Settle the cursor on the next token so branch consumption is measured
/// uniformly (a finished branch may not have cut its next token yet).
fn settled_offset(cursor: &mut Cursor) -> usize {
    let _ = cursor.peek();
    cursor.offset()
}

fn race<A>(cursor: &mut Cursor, a: &Action<A>, b: &Action<A>) -> ParseResult<A> {
    let saved = cursor.clone();

    let result_a = a(cursor);
    let offset_a = settled_offset(cursor);
    let state_a = std::mem::replace(cursor, saved);

    let result_b = b(cursor);
    let offset_b = settled_offset(cursor);

    match (result_a, result_b) {
        (Ok(value_a), Ok(value_b)) => {
            if offset_a > offset_b {
                *cursor = state_a;
                Ok(value_a)
            } else if offset_b > offset_a {
                Ok(value_b)
            } else {
                let (position, span) = match cursor.peek() {
                    Ok(token) => (token.position.clone(), token.span),
                    Err(_) => (Position::NoPos, curry_diagnostics::Span::DUMMY),
                };
                let _ = (value_a, value_b);
                Err(ParseError::Ambiguous { position, span: span.into() }.into())
            }
        }
        (Ok(value_a), Err(error_b)) => {
            if offset_b > offset_a {
                Err(error_b)
            } else {
                *cursor = state_a;
                Ok(value_a)
            }
        }
        (Err(error_a), Ok(value_b)) => {
            if offset_a > offset_b {
                *cursor = state_a;
                Err(error_a)
            } else {
                Ok(value_b)
            }
        }
        (Err(error_a), Err(error_b)) => {
            if offset_b > offset_a {
                Err(error_b)
            } else {
                *cursor = state_a;
                Err(error_a)
            }
        }
    }
}

// ============================================================================
// Token-level primitives
// ============================================================================

/// Accept exactly the tokens of the given category.
pub fn token(category: Category) -> Parser<Token> {
    let mut alts: FxHashMap<Category, Action<Token>> = FxHashMap::default();
    alts.insert(category, Rc::new(|cursor: &mut Cursor| cursor.bump()));
    Parser::from_table(Table { empty: None, alts, label: None })
}

/// The position of the next token, consuming nothing.
pub fn position() -> Parser<Position> {
    Parser::from_table(Table {
        empty: Some(Rc::new(|cursor: &mut Cursor| cursor.position())),
        alts: FxHashMap::default(),
        label: None,
    })
}

/// Deterministic choice over several parsers.
pub fn choice<A: 'static>(parsers: Vec<Parser<A>>) -> Parser<A> {
    let mut iter = parsers.into_iter();
    let first = iter.next().expect("choice of zero parsers");
    iter.fold(first, Parser::or)
}

// ============================================================================
// Layout combinators
// ============================================================================

/// Open a layout context at the column of the next token. Consumes nothing.
pub fn layout_on() -> Parser<()> {
    Parser::from_table(Table {
        empty: Some(Rc::new(|cursor: &mut Cursor| cursor.open_context())),
        alts: FxHashMap::default(),
        label: None,
    })
}

/// Open an explicit-brace context (layout disabled). Consumes nothing.
pub fn layout_off() -> Parser<()> {
    Parser::from_table(Table {
        empty: Some(Rc::new(|cursor: &mut Cursor| {
            cursor.open_explicit_context();
            Ok(())
        })),
        alts: FxHashMap::default(),
        label: None,
    })
}

/// Close the innermost layout context. Consumes nothing.
pub fn layout_end() -> Parser<()> {
    Parser::from_table(Table {
        empty: Some(Rc::new(|cursor: &mut Cursor| {
            cursor.close_context();
            Ok(())
        })),
        alts: FxHashMap::default(),
        label: None,
    })
}

/// Parse `body` as a layout block.
///
/// With an explicit opening brace the block is brace-delimited and layout is
/// disabled inside it. Otherwise an implicit context is opened at the column
/// of the block's first token and the block ends at a virtual closing brace,
/// or by popping the context when the surrounding construct continues on the
/// same indentation (e.g. the `in` of a `let`).
pub fn layout<A: 'static>(body: Parser<A>) -> Parser<A> {
    let explicit = token(Category::LBrace)
        .ignore_then(layout_off())
        .ignore_then(body.clone())
        .then_ignore(token(Category::RBrace).labelled("}"))
        .then_ignore(layout_end());
    let implicit = layout_on()
        .ignore_then(body)
        .then_ignore(token(Category::VRBrace).map(|_| ()).or(layout_end()));
    explicit.or(implicit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curry_lexer::TokenKind;

    fn cursor(source: &str) -> Cursor {
        Cursor::new(Lexer::new("Test.curry", source))
    }

    fn var() -> Parser<String> {
        token(Category::VarId).map(|t| match t.kind {
            TokenKind::VarId(s) => s.to_string(),
            _ => unreachable!(),
        })
    }

    #[test]
    fn test_token_and_sequence() {
        let p = var().then_ignore(token(Category::Equals)).then(var());
        let mut cur = cursor("x = y");
        assert_eq!(p.run(&mut cur).unwrap(), ("x".to_string(), "y".to_string()));
    }

    #[test]
    fn test_first_sets_are_inspectable() {
        let p = token(Category::KwIf).map(|_| 0).or(token(Category::KwCase).map(|_| 1));
        assert_eq!(p.first_set(), vec![Category::KwIf, Category::KwCase]);
        assert!(!p.accepts_empty());
        assert!(var().or_not().accepts_empty());
    }

    #[test]
    #[should_panic(expected = "overlap")]
    fn test_or_rejects_overlapping_first_sets() {
        let p = var().or(token(Category::VarId).map(|_| String::new()));
        // The conflict surfaces when the merged table is forced.
        let _ = p.first_set();
    }

    #[test]
    #[should_panic(expected = "empty sequence")]
    fn test_or_rejects_two_empty_actions() {
        let p = var().or_not().map(|_| 0).or(Parser::pure_with(|| 1));
        let _ = p.first_set();
    }

    #[test]
    fn test_restrict_resolves_overlap() {
        let minus_op = token(Category::Minus).map(|_| "op".to_string());
        let anything = choice(vec![
            token(Category::Minus).map(|_| "other".to_string()),
            var(),
        ]);
        let p = minus_op.or(anything.restrict(&[Category::Minus]));
        let mut cur = cursor("-");
        assert_eq!(p.run(&mut cur).unwrap(), "op");
        let mut cur = cursor("x");
        assert_eq!(p.run(&mut cur).unwrap(), "x");
    }

    #[test]
    fn test_or_longest_prefers_longer_parse() {
        // Both branches start with an identifier; the second consumes more.
        let short = var().map(|v| format!("short {v}"));
        let long = var()
            .then_ignore(token(Category::Equals))
            .then(var())
            .map(|(a, b)| format!("long {a} {b}"));
        let p = short.or_longest(long);

        let mut cur = cursor("x = y");
        assert_eq!(p.run(&mut cur).unwrap(), "long x y");

        let mut cur = cursor("x + y");
        assert_eq!(p.run(&mut cur).unwrap(), "short x");
    }

    #[test]
    fn test_or_longest_ambiguity() {
        let a = var().map(|_| 0);
        let b = var().map(|_| 1);
        let p = a.or_longest(b);
        let mut cur = cursor("x");
        match p.run(&mut cur) {
            Err(SyntaxError::Parse(ParseError::Ambiguous { .. })) => {}
            other => panic!("expected ambiguity error, got {other:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "left-recursive")]
    fn test_left_recursion_is_detected() {
        let p: Parser<i32> = Parser::recursive(|p| p.clone().then(var()).map(|(n, _)| n + 1));
        let _ = p.first_set();
    }

    #[test]
    fn test_recursive_parser() {
        // nested ::= '(' nested ')' | identifier
        let p: Parser<u32> = Parser::recursive(|nested| {
            token(Category::LParen)
                .ignore_then(nested)
                .then_ignore(token(Category::RParen))
                .map(|n| n + 1)
                .or(var().map(|_| 0))
        });
        let mut cur = cursor("((x))");
        assert_eq!(p.run(&mut cur).unwrap(), 2);
    }

    #[test]
    fn test_labelled_error() {
        let p = token(Category::KwThen).labelled("then");
        let mut cur = cursor("else");
        match p.run(&mut cur) {
            Err(SyntaxError::Parse(ParseError::Expected { label, .. })) => {
                assert_eq!(label, "then");
            }
            other => panic!("expected labelled error, got {other:?}"),
        }
    }

    #[test]
    fn test_separated_and_repeated() {
        let p = var().separated_by1(token(Category::Comma));
        let mut cur = cursor("a, b, c");
        assert_eq!(p.run(&mut cur).unwrap(), vec!["a", "b", "c"]);

        let p = var().repeated();
        let mut cur = cursor("= x");
        assert_eq!(p.run(&mut cur).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn test_layout_block_virtual_tokens() {
        // A block of identifiers, one per line, ended by dedent.
        let block = layout(var().separated_by1(token(Category::VSemi)));
        let p = block.then(var());
        let mut cur = cursor("  a\n  b\nc");
        let (items, after) = p.run(&mut cur).unwrap();
        assert_eq!(items, vec!["a", "b"]);
        assert_eq!(after, "c");
        assert_eq!(cur.context_depth(), 0);
    }

    #[test]
    fn test_layout_block_explicit_braces() {
        let block = layout(var().separated_by1(token(Category::Semi)));
        let mut cur = cursor("{ a; b }");
        assert_eq!(block.run(&mut cur).unwrap(), vec!["a", "b"]);
        assert_eq!(cur.context_depth(), 0);
    }

    #[test]
    fn test_layout_block_closed_by_pop() {
        // The block ends without a dedent; the ε-branch pops the context.
        let block = layout(var().separated_by1(token(Category::VSemi)));
        let p = block.then_ignore(token(Category::KwIn)).then(var());
        let mut cur = cursor("a in x");
        let (items, after) = p.run(&mut cur).unwrap();
        assert_eq!(items, vec!["a"]);
        assert_eq!(after, "x");
        assert_eq!(cur.context_depth(), 0);
    }
}

//! The Curry grammar, expressed over the LL(1) combinators.
//!
//! The grammar is built bottom-up: token-to-identifier helpers, types,
//! patterns, expressions (with statements and case alternatives),
//! declarations, and finally the module structure. Operator applications are
//! parsed without precedence into flat infix nodes; fixity resolution is a
//! later pass.
//!
//! Most of the grammar is LL(1) by construction. The genuinely ambiguous
//! spots use the longest-match alternative: the split between
//! signature/`external`/`free` declarations and value declarations (both
//! start with identifiers), value bindings versus expression statements in
//! `do` blocks, infix data constructor declarations, and `(-)` versus an
//! expression or pattern starting with a minus.

use crate::combinator::{choice, layout, position, token, Parser};
use curry_diagnostics::{HasPosition, ParseError, Position, Span, SrcRef};
use curry_lexer::{Category, TokenKind};
use curry_syntax::ast::*;
use curry_syntax::ident::{Ident, ModuleIdent, QualIdent};
use curry_syntax::literal::Literal;
use smol_str::SmolStr;

// ============================================================================
// Identifier and operator helpers
// ============================================================================

/// The name carried by a special-identifier token. These identifiers are
/// not reserved; the grammar gives them their own lookahead category and
/// otherwise treats them as plain identifiers.
fn special_name(kind: &TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::IdAs => Some("as"),
        TokenKind::IdCcall => Some("ccall"),
        TokenKind::IdForall => Some("forall"),
        TokenKind::IdHiding => Some("hiding"),
        TokenKind::IdInterface => Some("interface"),
        TokenKind::IdPrimitive => Some("primitive"),
        TokenKind::IdQualified => Some("qualified"),
        _ => None,
    }
}

const SPECIAL_IDS: [Category; 7] = [
    Category::IdAs,
    Category::IdCcall,
    Category::IdForall,
    Category::IdHiding,
    Category::IdInterface,
    Category::IdPrimitive,
    Category::IdQualified,
];

fn plain(ident: Ident) -> QualIdent {
    QualIdent::plain(ident)
}

fn qualify(path: &SmolStr, name: &SmolStr, pos: Position) -> QualIdent {
    QualIdent::qualified(
        ModuleIdent::from_dotted(path, pos.clone()),
        Ident::new(name.clone(), pos),
    )
}

/// A plain (unqualified) variable identifier.
fn var_ident() -> Parser<Ident> {
    let plain_var = token(Category::VarId).map(|t| match &t.kind {
        TokenKind::VarId(name) => Ident::new(name.clone(), t.position.clone()),
        _ => unreachable!(),
    });
    let specials = SPECIAL_IDS
        .iter()
        .map(|c| {
            token(*c).map(|t| {
                let name = special_name(&t.kind).expect("special identifier token");
                Ident::new(name, t.position.clone())
            })
        })
        .collect();
    plain_var.or(choice(specials))
}

fn qvar_ident() -> Parser<QualIdent> {
    token(Category::QVarId).map(|t| match &t.kind {
        TokenKind::QVarId(path, name) => qualify(path, name, t.position.clone()),
        _ => unreachable!(),
    })
}

/// A variable reference, possibly qualified.
fn qvar() -> Parser<QualIdent> {
    var_ident().map(plain).or(qvar_ident())
}

/// A plain constructor identifier.
fn con_ident() -> Parser<Ident> {
    token(Category::ConId).map(|t| match &t.kind {
        TokenKind::ConId(name) => Ident::new(name.clone(), t.position.clone()),
        _ => unreachable!(),
    })
}

/// A constructor reference, possibly qualified.
fn qcon() -> Parser<QualIdent> {
    let qualified = token(Category::QConId).map(|t| match &t.kind {
        TokenKind::QConId(path, name) => qualify(path, name, t.position.clone()),
        _ => unreachable!(),
    });
    con_ident().map(plain).or(qualified)
}

/// A module identifier (a possibly dotted constructor name).
fn module_ident() -> Parser<ModuleIdent> {
    let simple = token(Category::ConId).map(|t| match &t.kind {
        TokenKind::ConId(name) => ModuleIdent::from_dotted(name, t.position.clone()),
        _ => unreachable!(),
    });
    let dotted = token(Category::QConId).map(|t| match &t.kind {
        TokenKind::QConId(path, name) => {
            ModuleIdent::from_dotted(&format!("{path}.{name}"), t.position.clone())
        }
        _ => unreachable!(),
    });
    simple.or(dotted)
}

/// An operator symbol as a plain identifier, for fixity declarations,
/// parenthesized operator names and signatures like `(+) :: ...`.
fn op_ident() -> Parser<Ident> {
    let sym = |c: Category| {
        token(c).map(|t| {
            let name: SmolStr = match &t.kind {
                TokenKind::VarSym(s) | TokenKind::ConSym(s) => s.clone(),
                TokenKind::Colon => ":".into(),
                TokenKind::Minus => "-".into(),
                TokenKind::MinusDot => "-.".into(),
                _ => unreachable!(),
            };
            Ident::new(name, t.position.clone())
        })
    };
    choice(vec![
        sym(Category::VarSym),
        sym(Category::ConSym),
        sym(Category::Colon),
        sym(Category::Minus),
        sym(Category::MinusDot),
    ])
}

/// An infix operator in an expression, including backquoted identifiers.
fn infix_op() -> Parser<InfixOp> {
    let var_sym = token(Category::VarSym).map(|t| match &t.kind {
        TokenKind::VarSym(s) => InfixOp::Op(plain(Ident::new(s.clone(), t.position.clone()))),
        _ => unreachable!(),
    });
    let qvar_sym = token(Category::QVarSym).map(|t| match &t.kind {
        TokenKind::QVarSym(path, name) => InfixOp::Op(qualify(path, name, t.position.clone())),
        _ => unreachable!(),
    });
    let con_sym = token(Category::ConSym).map(|t| match &t.kind {
        TokenKind::ConSym(s) => InfixOp::Constr(plain(Ident::new(s.clone(), t.position.clone()))),
        _ => unreachable!(),
    });
    let qcon_sym = token(Category::QConSym).map(|t| match &t.kind {
        TokenKind::QConSym(path, name) => InfixOp::Constr(qualify(path, name, t.position.clone())),
        _ => unreachable!(),
    });
    let cons = token(Category::Colon)
        .map(|t| InfixOp::Constr(plain(Ident::new(":", t.position.clone()))));
    let minus = token(Category::Minus)
        .map(|t| InfixOp::Op(plain(Ident::new("-", t.position.clone()))));
    let minus_dot = token(Category::MinusDot)
        .map(|t| InfixOp::Op(plain(Ident::new("-.", t.position.clone()))));
    let backquoted = token(Category::Backtick)
        .ignore_then(qvar().map(InfixOp::Op).or(qcon().map(InfixOp::Constr)))
        .then_ignore(token(Category::Backtick).labelled("`"));
    choice(vec![var_sym, qvar_sym, con_sym, qcon_sym, cons, minus, minus_dot, backquoted])
}

/// An infix operator in a pattern, with its constructor-ness.
fn pattern_op() -> Parser<(QualIdent, bool)> {
    infix_op().map(|op| match op {
        InfixOp::Op(q) => (q, false),
        InfixOp::Constr(q) => (q, true),
    })
}

// ============================================================================
// Literals and small shared pieces
// ============================================================================

/// The identifier attached to integer literals for later overload
/// resolution; a placeholder until that pass runs.
fn int_tag(position: Position) -> Ident {
    Ident::anonymous(position)
}

fn literal() -> Parser<Literal> {
    let int = token(Category::Int).map(|t| match t.kind {
        TokenKind::Int(value) => Literal::Int(int_tag(t.position), value),
        _ => unreachable!(),
    });
    let float = token(Category::Float).map(|t| match t.kind {
        TokenKind::Float(value) => Literal::Float(SrcRef::none(), value),
        _ => unreachable!(),
    });
    let char_lit = token(Category::Char).map(|t| match t.kind {
        TokenKind::Char(value) => Literal::Char(SrcRef::none(), value),
        _ => unreachable!(),
    });
    let string_lit = token(Category::String).map(|t| match t.kind {
        TokenKind::String(value) => Literal::String(SrcRef::none(), value),
        _ => unreachable!(),
    });
    choice(vec![int, float, char_lit, string_lit])
}

/// A numeric literal, as allowed after a negation sign in patterns.
fn numeric_literal() -> Parser<Literal> {
    let int = token(Category::Int).map(|t| match t.kind {
        TokenKind::Int(value) => Literal::Int(int_tag(t.position), value),
        _ => unreachable!(),
    });
    let float = token(Category::Float).map(|t| match t.kind {
        TokenKind::Float(value) => Literal::Float(SrcRef::none(), value),
        _ => unreachable!(),
    });
    int.or(float)
}

fn minus_ident() -> Parser<Ident> {
    let minus = token(Category::Minus).map(|t| Ident::new("-", t.position.clone()));
    let minus_dot = token(Category::MinusDot).map(|t| Ident::new("-.", t.position.clone()));
    minus.or(minus_dot)
}

fn unit_ident(position: Position) -> QualIdent {
    plain(Ident::new("()", position))
}

fn tuple_ident(commas: usize, position: Position) -> QualIdent {
    let name = format!("({})", ",".repeat(commas));
    plain(Ident::new(name, position))
}

/// A statement separator inside a layout block: a real or virtual semicolon.
fn semi() -> Parser<()> {
    token(Category::Semi).map(|_| ()).or(token(Category::VSemi).map(|_| ()))
}

fn field<T: 'static>(value: Parser<T>) -> Parser<Field<T>> {
    position()
        .then(qvar())
        .then_ignore(token(Category::Equals).labelled("="))
        .then(value)
        .map(|((position, label), value)| Field { position, label, value })
}

// ============================================================================
// Types
// ============================================================================

pub(crate) fn type_expr() -> Parser<TypeExpr> {
    Parser::recursive(|ty| {
        app_type(ty.clone())
            .then(token(Category::RArrow).ignore_then(ty).or_not())
            .map(|(domain, range)| match range {
                Some(range) => TypeExpr::Arrow(Box::new(domain), Box::new(range)),
                None => domain,
            })
    })
}

/// A type at application level: a constructor applied to atomic types, or a
/// single atomic type.
fn app_type(ty: Parser<TypeExpr>) -> Parser<TypeExpr> {
    let con_app = qcon()
        .then(atomic_type(ty.clone()).repeated())
        .map(|(name, args)| TypeExpr::Constructor(name, args));
    choice(vec![
        con_app,
        var_ident().map(TypeExpr::Variable),
        paren_type(ty.clone()),
        bracket_type(ty),
    ])
}

fn atomic_type(ty: Parser<TypeExpr>) -> Parser<TypeExpr> {
    choice(vec![
        qcon().map(|name| TypeExpr::Constructor(name, vec![])),
        var_ident().map(TypeExpr::Variable),
        paren_type(ty.clone()),
        bracket_type(ty),
    ])
}

fn paren_type(ty: Parser<TypeExpr>) -> Parser<TypeExpr> {
    let unit = token(Category::RParen)
        .map(|t| TypeExpr::Constructor(unit_ident(t.position.clone()), vec![]));
    let grouped = ty
        .separated_by1(token(Category::Comma))
        .then_ignore(token(Category::RParen).labelled(")"))
        .map(|mut types| {
            if types.len() == 1 {
                TypeExpr::Paren(Box::new(types.remove(0)))
            } else {
                TypeExpr::Tuple(types)
            }
        });
    token(Category::LParen).ignore_then(unit.or(grouped))
}

fn bracket_type(ty: Parser<TypeExpr>) -> Parser<TypeExpr> {
    token(Category::LBracket)
        .ignore_then(ty)
        .then_ignore(token(Category::RBracket).labelled("]"))
        .map(|t| TypeExpr::List(Box::new(t)))
}

// ============================================================================
// Patterns
// ============================================================================

enum ConTail {
    Fields(Vec<Field<Pattern>>),
    Args(Vec<Pattern>),
}

enum VarTail {
    As(Pattern),
    Args(Vec<Pattern>),
}

pub(crate) fn pattern() -> Parser<Pattern> {
    Parser::recursive(|pat| {
        let atom = pattern_atom(pat.clone());

        let negative = minus_ident()
            .then(numeric_literal())
            .map(|(minus, lit)| Pattern::Negative(minus, lit));

        let con_app = qcon()
            .then(record_fields(pat.clone()).or(atom.clone().repeated().map(ConTail::Args)))
            .map(|(name, tail)| match tail {
                ConTail::Fields(fields) => Pattern::Record(name, fields),
                ConTail::Args(args) => Pattern::Constructor(name, args),
            });

        let var_tail = token(Category::At)
            .ignore_then(atom.clone())
            .map(VarTail::As)
            .or(atom.clone().repeated().map(VarTail::Args));
        let var_app = var_ident().then(var_tail).map(|(var, tail)| match tail {
            VarTail::As(inner) => Pattern::As(var, Box::new(inner)),
            VarTail::Args(args) if args.is_empty() => Pattern::Variable(var),
            VarTail::Args(args) => Pattern::FunctionPattern(plain(var), args),
        });

        let qvar_app = qvar_ident()
            .then(atom.clone().repeated())
            .map(|(name, args)| Pattern::FunctionPattern(name, args));

        let head = choice(vec![
            negative,
            con_app,
            var_app,
            qvar_app,
            non_ident_pattern_atom(pat.clone(), atom),
        ]);

        head.then(pattern_op().then(pat).or_not())
            .map(|(lhs, tail)| match tail {
                None => lhs,
                Some(((op, true), rhs)) => Pattern::Infix(Box::new(lhs), op, Box::new(rhs)),
                Some(((op, false), rhs)) => {
                    Pattern::InfixFuncPattern(Box::new(lhs), op, Box::new(rhs))
                }
            })
    })
}

/// A pattern usable as a function argument.
fn pattern_atom(pat: Parser<Pattern>) -> Parser<Pattern> {
    Parser::recursive(|atom| {
        let var = var_ident()
            .then(token(Category::At).ignore_then(atom.clone()).or_not())
            .map(|(var, tail)| match tail {
                Some(inner) => Pattern::As(var, Box::new(inner)),
                None => Pattern::Variable(var),
            });
        let con = qcon()
            .then(record_fields(pat.clone()).or_not())
            .map(|(name, tail)| match tail {
                Some(ConTail::Fields(fields)) => Pattern::Record(name, fields),
                _ => Pattern::Constructor(name, vec![]),
            });
        let qvar_ref = qvar_ident().map(|name| Pattern::FunctionPattern(name, vec![]));
        choice(vec![var, con, qvar_ref, non_ident_pattern_atom(pat.clone(), atom)])
    })
}

/// Pattern atoms that do not start with an identifier.
fn non_ident_pattern_atom(pat: Parser<Pattern>, atom: Parser<Pattern>) -> Parser<Pattern> {
    let wildcard = token(Category::Underscore)
        .map(|t| Pattern::Variable(Ident::anonymous(t.position.clone())));
    let lit = literal().map(Pattern::Literal);
    let lazy = token(Category::Tilde)
        .ignore_then(atom)
        .map(|p| Pattern::Lazy(SrcRef::none(), Box::new(p)));
    let list = token(Category::LBracket)
        .ignore_then(pat.clone().separated_by(token(Category::Comma)))
        .then_ignore(token(Category::RBracket).labelled("]"))
        .map(|items| Pattern::List(SrcRef::none(), items));
    choice(vec![wildcard, lit, lazy, list, paren_pattern(pat)])
}

fn record_fields(pat: Parser<Pattern>) -> Parser<ConTail> {
    token(Category::LBrace)
        .ignore_then(field(pat).separated_by(token(Category::Comma)))
        .then_ignore(token(Category::RBrace).labelled("}"))
        .map(ConTail::Fields)
}

fn paren_pattern(pat: Parser<Pattern>) -> Parser<Pattern> {
    let unit = token(Category::RParen)
        .map(|t| Pattern::Constructor(unit_ident(t.position.clone()), vec![]));

    // `(+)`: an operator used as an ordinary name. The parentheses are kept
    // so left-hand-side classification can recognise `(+) x y = ...`.
    let op_ref = choice(vec![
        sym_pattern(Category::VarSym),
        sym_pattern(Category::ConSym),
        sym_pattern(Category::Colon),
    ])
    .then_ignore(token(Category::RParen).labelled(")"))
    .map(|p| Pattern::Paren(Box::new(p)));

    // `(-)` versus `(-1)` or any other element list: both start with a
    // minus token, so the longest parse decides.
    let minus_ref = minus_ident()
        .then_ignore(token(Category::RParen))
        .map(|minus| Pattern::Paren(Box::new(Pattern::Variable(minus))));
    let elements = pat
        .separated_by1(token(Category::Comma))
        .then_ignore(token(Category::RParen).labelled(")"))
        .map(|mut items| {
            if items.len() == 1 {
                Pattern::Paren(Box::new(items.remove(0)))
            } else {
                Pattern::Tuple(SrcRef::none(), items)
            }
        });

    token(Category::LParen).ignore_then(choice(vec![
        unit,
        op_ref,
        minus_ref.or_longest(elements),
    ]))
}

fn sym_pattern(category: Category) -> Parser<Pattern> {
    token(category).map(|t| {
        let name: SmolStr = match &t.kind {
            TokenKind::VarSym(s) | TokenKind::ConSym(s) => s.clone(),
            TokenKind::Colon => ":".into(),
            _ => unreachable!(),
        };
        Pattern::Variable(Ident::new(name, t.position.clone()))
    })
}

// ============================================================================
// Expressions
// ============================================================================

/// One link of an operator chain: the operator and its right operand. The
/// operand is missing only for the trailing operator of a left section.
type OpLink = (InfixOp, Option<Expression>);

/// An operator chain before section/infix classification.
type Chain = (Expression, Vec<OpLink>);

pub(crate) fn expression(pat: Parser<Pattern>, ty: Parser<TypeExpr>) -> Parser<Expression> {
    Parser::recursive(|expr| {
        let decl = declaration(expr.clone(), pat.clone(), ty.clone());
        let decl_block = layout(decl.separated_by(semi()));
        let stmt = statement(expr.clone(), pat.clone(), decl_block.clone());

        let chain: Parser<Chain> = Parser::recursive(|chain| {
            let atom = expression_atom(
                expr.clone(),
                chain,
                pat.clone(),
                ty.clone(),
                decl_block,
                stmt,
            );

            // Record construction and update bind tighter than application.
            let record_suffix = token(Category::LBrace)
                .ignore_then(field(expr.clone()).separated_by(token(Category::Comma)))
                .then_ignore(token(Category::RBrace).labelled("}"));
            let suffixed = atom.then(record_suffix.repeated()).map(|(base, suffixes)| {
                suffixes.into_iter().fold(base, |e, fields| match e {
                    Expression::Constructor(name) => Expression::Record(name, fields),
                    other => Expression::RecordUpdate(Box::new(other), fields),
                })
            });

            let app = suffixed.at_least_one().map(|mut atoms| {
                let head = atoms.remove(0);
                atoms
                    .into_iter()
                    .fold(head, |f, arg| Expression::Apply(Box::new(f), Box::new(arg)))
            });

            let term = Parser::recursive(|term| {
                let negated = minus_ident()
                    .then(term)
                    .map(|(minus, e)| Expression::UnaryMinus(minus, Box::new(e)));
                negated.or(app)
            });

            term.clone().then(infix_op().then(term.or_not()).repeated())
        });

        let op_expr = chain.try_map(|(head, links)| build_infix(head, links));

        op_expr
            .then(token(Category::ColonColon).ignore_then(ty).or_not())
            .map(|(e, annotation)| match annotation {
                Some(t) => Expression::Typed(Box::new(e), t),
                None => e,
            })
    })
}

/// Fold an operator chain into nested infix applications. A missing operand
/// is only legal inside parentheses (a left section), so it is rejected
/// here.
fn build_infix(head: Expression, links: Vec<OpLink>) -> Result<Expression, ParseError> {
    let mut result = head;
    for (op, operand) in links {
        match operand {
            Some(rhs) => {
                result = Expression::InfixApply(Box::new(result), op, Box::new(rhs));
            }
            None => {
                return Err(ParseError::Expected {
                    label: "expression".to_string(),
                    position: op.ident().get_position(),
                    span: Span::DUMMY.into(),
                });
            }
        }
    }
    Ok(result)
}

fn expression_atom(
    expr: Parser<Expression>,
    chain: Parser<Chain>,
    pat: Parser<Pattern>,
    ty: Parser<TypeExpr>,
    decl_block: Parser<Vec<Decl>>,
    stmt: Parser<Statement>,
) -> Parser<Expression> {
    let lit = literal().map(Expression::Literal);
    let variable = qvar().map(Expression::Variable);
    let anon = token(Category::Underscore)
        .map(|t| Expression::Variable(plain(Ident::anonymous(t.position.clone()))));
    let constructor = qcon().map(Expression::Constructor);

    let let_expr = token(Category::KwLet)
        .ignore_then(decl_block.clone())
        .then_ignore(token(Category::KwIn).labelled("in"))
        .then(expr.clone())
        .map(|(decls, body)| Expression::Let(decls, Box::new(body)));

    let do_expr = token(Category::KwDo)
        .then(layout(stmt.clone().separated_by1(semi())))
        .try_map(|(do_token, mut stmts)| match stmts.pop() {
            Some(Statement::Expr(last)) => Ok(Expression::Do(stmts, Box::new(last))),
            _ => Err(ParseError::Expected {
                label: "expression".to_string(),
                position: do_token.position.clone(),
                span: do_token.span.into(),
            }),
        });

    let if_expr = token(Category::KwIf)
        .ignore_then(expr.clone())
        .then_ignore(token(Category::KwThen).labelled("then"))
        .then(expr.clone())
        .then_ignore(token(Category::KwElse).labelled("else"))
        .then(expr.clone())
        .map(|((cond, then_branch), else_branch)| {
            Expression::IfThenElse(
                SrcRef::none(),
                Box::new(cond),
                Box::new(then_branch),
                Box::new(else_branch),
            )
        });

    let alts = layout(
        alternative(expr.clone(), pat.clone(), decl_block).separated_by1(semi()),
    );
    let case_expr = case_of(Category::KwCase, CaseType::Rigid, expr.clone(), alts.clone());
    let fcase_expr = case_of(Category::KwFcase, CaseType::Flex, expr.clone(), alts);

    let lambda = token(Category::Backslash)
        .ignore_then(pattern_atom(pat).at_least_one())
        .then_ignore(token(Category::RArrow).labelled("->"))
        .then(expr.clone())
        .map(|(params, body)| Expression::Lambda(SrcRef::none(), params, Box::new(body)));

    choice(vec![
        lit,
        variable,
        anon,
        constructor,
        let_expr,
        do_expr,
        if_expr,
        case_expr,
        fcase_expr,
        lambda,
        paren_expression(expr.clone(), chain, ty),
        bracket_expression(expr, stmt),
    ])
}

fn case_of(
    keyword: Category,
    case_type: CaseType,
    expr: Parser<Expression>,
    alts: Parser<Vec<Alt>>,
) -> Parser<Expression> {
    token(keyword)
        .ignore_then(expr)
        .then_ignore(token(Category::KwOf).labelled("of"))
        .then(alts)
        .map(move |(scrutinee, alts)| {
            Expression::Case(SrcRef::none(), case_type, Box::new(scrutinee), alts)
        })
}

fn alternative(
    expr: Parser<Expression>,
    pat: Parser<Pattern>,
    decl_block: Parser<Vec<Decl>>,
) -> Parser<Alt> {
    position()
        .then(pat)
        .then(rhs(Category::RArrow, expr, decl_block))
        .map(|((position, pattern), rhs)| Alt { position, pattern, rhs })
}

fn statement(
    expr: Parser<Expression>,
    pat: Parser<Pattern>,
    decl_block: Parser<Vec<Decl>>,
) -> Parser<Statement> {
    // A `let` statement becomes a let expression when `in` follows.
    let let_stmt = token(Category::KwLet)
        .ignore_then(decl_block)
        .then(token(Category::KwIn).ignore_then(expr.clone()).or_not())
        .map(|(decls, body)| match body {
            Some(body) => Statement::Expr(Expression::Let(decls, Box::new(body))),
            None => Statement::Decl(decls),
        });

    let bind = pat
        .then_ignore(token(Category::LArrow))
        .then(expr.clone())
        .map(|(pattern, source)| Statement::Bind(SrcRef::none(), pattern, source));

    // `let` is claimed by the statement form above.
    let expr_stmt = expr.map(Statement::Expr).restrict(&[Category::KwLet]);

    let_stmt.or(bind.or_longest(expr_stmt))
}

// ============================================================================
// Parenthesized expressions: grouping, tuples, sections, operator names
// ============================================================================

enum OpFirstTail {
    Reference,
    Section(Expression),
}

enum ParenTail {
    Close,
    Tuple(Vec<Expression>),
    /// `:: t` followed by `)` (None) or a tuple continuation (Some).
    Typed(TypeExpr, Option<Vec<Expression>>),
}

fn paren_expression(
    expr: Parser<Expression>,
    chain: Parser<Chain>,
    ty: Parser<TypeExpr>,
) -> Parser<Expression> {
    let unit = token(Category::RParen)
        .map(|t| Expression::Constructor(unit_ident(t.position.clone())));

    // `(,)`, `(,,)`, ...: tuple constructors.
    let tuple_con = token(Category::Comma)
        .at_least_one()
        .then_ignore(token(Category::RParen).labelled(")"))
        .map(|commas| {
            let position = commas[0].position.clone();
            Expression::Constructor(tuple_ident(commas.len(), position))
        });

    // After an operator: a bare operator name or a right section. Minus is
    // not an operator here; `(- e)` is unary negation.
    let reference = token(Category::RParen).map(|_| OpFirstTail::Reference);
    let section = expr
        .clone()
        .then_ignore(token(Category::RParen).labelled(")"))
        .map(OpFirstTail::Section);
    let op_first = infix_op()
        .restrict(&[Category::Minus, Category::MinusDot])
        .then(reference.or(section))
        .map(|(op, tail)| match tail {
            OpFirstTail::Reference => match op {
                InfixOp::Op(q) => Expression::Variable(q),
                InfixOp::Constr(q) => Expression::Constructor(q),
            },
            OpFirstTail::Section(operand) => Expression::RightSection(op, Box::new(operand)),
        });

    // `(-)` and `(-.)` versus a grouped expression starting with unary
    // minus; the longest parse decides.
    let minus_ref = minus_ident()
        .then_ignore(token(Category::RParen))
        .map(|minus| Expression::Variable(plain(minus)));

    let grouped = chain
        .then(paren_tail(expr, ty))
        .try_map(|((head, links), tail)| assemble_paren(head, links, tail));

    token(Category::LParen).ignore_then(choice(vec![
        unit,
        tuple_con,
        op_first,
        minus_ref.or_longest(grouped),
    ]))
}

fn paren_tail(expr: Parser<Expression>, ty: Parser<TypeExpr>) -> Parser<ParenTail> {
    let close = token(Category::RParen).map(|_| ParenTail::Close);
    let tuple = token(Category::Comma)
        .ignore_then(expr.clone().separated_by1(token(Category::Comma)))
        .then_ignore(token(Category::RParen).labelled(")"))
        .map(ParenTail::Tuple);
    let typed = token(Category::ColonColon)
        .ignore_then(ty)
        .then(
            token(Category::RParen)
                .map(|_| None)
                .or(token(Category::Comma)
                    .ignore_then(expr.separated_by1(token(Category::Comma)))
                    .then_ignore(token(Category::RParen).labelled(")"))
                    .map(Some)),
        )
        .map(|(t, rest)| ParenTail::Typed(t, rest));
    choice(vec![close, tuple, typed])
}

fn assemble_paren(
    head: Expression,
    mut links: Vec<OpLink>,
    tail: ParenTail,
) -> Result<Expression, ParseError> {
    // A trailing operator (missing right operand) is a left section, legal
    // only directly before the closing parenthesis.
    let trailing = match links.last() {
        Some((_, None)) => {
            let (op, _) = links.pop().expect("links is non-empty");
            Some(op)
        }
        _ => None,
    };
    let e = build_infix(head, links)?;

    if let Some(op) = trailing {
        return match tail {
            ParenTail::Close => Ok(Expression::LeftSection(Box::new(e), op)),
            _ => Err(ParseError::Expected {
                label: "expression".to_string(),
                position: op.ident().get_position(),
                span: Span::DUMMY.into(),
            }),
        };
    }

    Ok(match tail {
        ParenTail::Close => Expression::Paren(Box::new(e)),
        ParenTail::Tuple(rest) => {
            let mut items = Vec::with_capacity(rest.len() + 1);
            items.push(e);
            items.extend(rest);
            Expression::Tuple(SrcRef::none(), items)
        }
        ParenTail::Typed(t, None) => {
            Expression::Paren(Box::new(Expression::Typed(Box::new(e), t)))
        }
        ParenTail::Typed(t, Some(rest)) => {
            let mut items = Vec::with_capacity(rest.len() + 1);
            items.push(Expression::Typed(Box::new(e), t));
            items.extend(rest);
            Expression::Tuple(SrcRef::none(), items)
        }
    })
}

// ============================================================================
// Bracketed expressions: lists, enumerations, comprehensions
// ============================================================================

enum BracketTail {
    Single,
    EnumFrom,
    EnumFromTo(Expression),
    Comprehension(Vec<Statement>),
    CommaFirst(Expression, CommaTail),
}

enum CommaTail {
    EnumFromThen,
    EnumFromThenTo(Expression),
    List(Vec<Expression>),
}

fn bracket_expression(expr: Parser<Expression>, stmt: Parser<Statement>) -> Parser<Expression> {
    let empty = token(Category::RBracket).map(|_| Expression::List(SrcRef::none(), vec![]));
    let non_empty = expr
        .clone()
        .then(bracket_tail(expr, stmt))
        .map(|(first, tail)| finish_bracket(first, tail));
    token(Category::LBracket).ignore_then(empty.or(non_empty))
}

fn bracket_tail(expr: Parser<Expression>, stmt: Parser<Statement>) -> Parser<BracketTail> {
    let close = token(Category::RBracket).map(|_| BracketTail::Single);

    let enumeration = token(Category::DotDot).ignore_then(
        token(Category::RBracket)
            .map(|_| BracketTail::EnumFrom)
            .or(expr
                .clone()
                .then_ignore(token(Category::RBracket).labelled("]"))
                .map(BracketTail::EnumFromTo)),
    );

    // The qualifiers of a list comprehension share the statement grammar,
    // separated by commas.
    let comprehension = token(Category::Bar)
        .ignore_then(stmt.separated_by1(token(Category::Comma)))
        .then_ignore(token(Category::RBracket).labelled("]"))
        .map(BracketTail::Comprehension);

    let comma_tail = {
        let enum_then = token(Category::DotDot).ignore_then(
            token(Category::RBracket)
                .map(|_| CommaTail::EnumFromThen)
                .or(expr
                    .clone()
                    .then_ignore(token(Category::RBracket).labelled("]"))
                    .map(CommaTail::EnumFromThenTo)),
        );
        let more = token(Category::Comma)
            .ignore_then(expr.clone())
            .repeated()
            .then_ignore(token(Category::RBracket).labelled("]"))
            .map(CommaTail::List);
        enum_then.or(more)
    };
    let comma = token(Category::Comma)
        .ignore_then(expr)
        .then(comma_tail)
        .map(|(second, tail)| BracketTail::CommaFirst(second, tail));

    choice(vec![close, enumeration, comprehension, comma])
}

fn finish_bracket(first: Expression, tail: BracketTail) -> Expression {
    match tail {
        BracketTail::Single => Expression::List(SrcRef::none(), vec![first]),
        BracketTail::EnumFrom => Expression::EnumFrom(Box::new(first)),
        BracketTail::EnumFromTo(to) => Expression::EnumFromTo(Box::new(first), Box::new(to)),
        BracketTail::Comprehension(qualifiers) => {
            Expression::ListCompr(SrcRef::none(), Box::new(first), qualifiers)
        }
        BracketTail::CommaFirst(second, CommaTail::EnumFromThen) => {
            Expression::EnumFromThen(Box::new(first), Box::new(second))
        }
        BracketTail::CommaFirst(second, CommaTail::EnumFromThenTo(to)) => {
            Expression::EnumFromThenTo(Box::new(first), Box::new(second), Box::new(to))
        }
        BracketTail::CommaFirst(second, CommaTail::List(rest)) => {
            let mut items = Vec::with_capacity(rest.len() + 2);
            items.push(first);
            items.push(second);
            items.extend(rest);
            Expression::List(SrcRef::none(), items)
        }
    }
}

// ============================================================================
// Right-hand sides
// ============================================================================

fn rhs(
    separator: Category,
    expr: Parser<Expression>,
    decl_block: Parser<Vec<Decl>>,
) -> Parser<Rhs> {
    let sep_label = separator.name();

    let where_clause = token(Category::KwWhere)
        .ignore_then(decl_block)
        .or_not()
        .map(Option::unwrap_or_default);

    let simple = position()
        .then_ignore(token(separator))
        .then(expr.clone())
        .then(where_clause.clone())
        .map(|((position, body), decls)| Rhs::Simple(position, body, decls));

    let guard = token(Category::Bar)
        .ignore_then(position().then(expr.clone()))
        .then_ignore(token(separator).labelled(sep_label))
        .then(expr)
        .map(|((position, guard), body)| CondExpr { position, guard, expr: body });
    let guarded = position()
        .then(guard.at_least_one())
        .then(where_clause)
        .map(|((position, guards), decls)| Rhs::Guarded(position, guards, decls));

    simple.or(guarded).labelled(sep_label)
}

// ============================================================================
// Declarations
// ============================================================================

pub(crate) fn declaration(
    expr: Parser<Expression>,
    pat: Parser<Pattern>,
    ty: Parser<TypeExpr>,
) -> Parser<Decl> {
    Parser::recursive(|decl| {
        let decl_block = layout(decl.separated_by(semi()));
        let rhs_eq = rhs(Category::Equals, expr.clone(), decl_block);

        let value = signature_like(ty.clone()).or_longest(equation(pat.clone(), rhs_eq));

        choice(vec![
            fixity_decl(),
            data_decl(ty.clone()),
            newtype_decl(ty.clone()),
            type_synonym_decl(ty.clone()),
            foreign_decl(ty),
            value,
        ])
    })
}

/// Declarations of the shape `f1, ..., fn <tail>`: type signatures,
/// `external` declarations and `free` declarations.
fn signature_like(ty: Parser<TypeExpr>) -> Parser<Decl> {
    enum Tail {
        Signature(TypeExpr),
        External,
        Free,
    }

    let fun_name = var_ident().or(token(Category::LParen)
        .ignore_then(op_ident())
        .then_ignore(token(Category::RParen).labelled(")")));

    let tail = choice(vec![
        token(Category::ColonColon).ignore_then(ty).map(Tail::Signature),
        token(Category::KwExternal).map(|_| Tail::External),
        token(Category::KwFree).map(|_| Tail::Free),
    ]);

    position()
        .then(fun_name.separated_by1(token(Category::Comma)))
        .then(tail)
        .map(|((position, names), tail)| match tail {
            Tail::Signature(ty) => Decl::TypeSig(position, names, ty),
            Tail::External => Decl::External(position, names),
            Tail::Free => Decl::Free(position, names),
        })
}

/// A value declaration: a function equation or a pattern binding. Both are
/// parsed as a pattern (possibly applied to further argument patterns) and
/// classified afterwards.
fn equation(pat: Parser<Pattern>, rhs_eq: Parser<Rhs>) -> Parser<Decl> {
    position()
        .then(pat.clone())
        .then(pattern_atom(pat).repeated())
        .then(rhs_eq)
        .try_map(|(((position, base), extras), rhs)| {
            classify_value_decl(position, base, extras, rhs)
        })
}

fn classify_value_decl(
    position: Position,
    base: Pattern,
    extras: Vec<Pattern>,
    rhs: Rhs,
) -> Result<Decl, ParseError> {
    if extras.is_empty() {
        return Ok(match pattern_lhs(base) {
            Ok(lhs) => function_decl(position, lhs, rhs),
            Err(p) => Decl::Pattern(position, p, rhs),
        });
    }

    // `(lhs) p1 ... pn`: the base pattern must itself be a left-hand side.
    match pattern_lhs(base) {
        Ok(Lhs::Fun(name, args)) if args.is_empty() => {
            Ok(function_decl(position, Lhs::Fun(name, extras), rhs))
        }
        Ok(lhs) => Ok(function_decl(position, Lhs::Ap(Box::new(lhs), extras), rhs)),
        Err(p) => Err(ParseError::Expected {
            label: "function left-hand side".to_string(),
            position: p.get_position(),
            span: Span::DUMMY.into(),
        }),
    }
}

/// Reinterpret a pattern as a function left-hand side. An application whose
/// head is not a constructor identifier (not the cons constructor, not
/// qualified, not a tuple constructor) defines a function; everything else
/// is handed back as a pattern binding.
fn pattern_lhs(p: Pattern) -> Result<Lhs, Pattern> {
    match p {
        Pattern::Variable(v) if !v.is_anonymous() => Ok(Lhs::Fun(v, vec![])),
        Pattern::Constructor(c, args) if !c.is_constructor_ident() => {
            Ok(Lhs::Fun(c.unqualify(), args))
        }
        Pattern::FunctionPattern(f, args) if !f.is_constructor_ident() => {
            Ok(Lhs::Fun(f.unqualify(), args))
        }
        Pattern::InfixFuncPattern(l, op, r) if !op.is_qualified() => {
            Ok(Lhs::Op(*l, op.unqualify(), *r))
        }
        Pattern::Paren(inner) => {
            pattern_lhs(*inner).map_err(|p| Pattern::Paren(Box::new(p)))
        }
        other => Err(other),
    }
}

fn function_decl(position: Position, lhs: Lhs, rhs: Rhs) -> Decl {
    let name = lhs.function().clone();
    let equation = Equation { position: position.clone(), lhs, rhs };
    Decl::Function(position, name, vec![equation])
}

fn fixity_decl() -> Parser<Decl> {
    let fixity = choice(vec![
        token(Category::KwInfixl).map(|_| Fixity::InfixL),
        token(Category::KwInfixr).map(|_| Fixity::InfixR),
        token(Category::KwInfix).map(|_| Fixity::Infix),
    ]);

    let precedence = token(Category::Int)
        .try_map(|t| {
            let value = match &t.kind {
                TokenKind::Int(v) => v.clone(),
                _ => unreachable!(),
            };
            u32::try_from(&value)
                .ok()
                .filter(|p| *p <= 9)
                .ok_or_else(|| ParseError::Expected {
                    label: "precedence between 0 and 9".to_string(),
                    position: t.position.clone(),
                    span: t.span.into(),
                })
        })
        .or_not();

    let backquoted = token(Category::Backtick)
        .ignore_then(var_ident().or(con_ident()))
        .then_ignore(token(Category::Backtick).labelled("`"));
    let operator = op_ident().or(backquoted);

    position()
        .then(fixity)
        .then(precedence)
        .then(operator.separated_by1(token(Category::Comma)))
        .map(|(((position, fixity), precedence), operators)| {
            Decl::Infix(position, fixity, precedence, operators)
        })
}

fn data_decl(ty: Parser<TypeExpr>) -> Parser<Decl> {
    let constrs = token(Category::Equals)
        .ignore_then(constr_decl(ty.clone()).separated_by1(token(Category::Bar)))
        .or_not()
        .map(Option::unwrap_or_default);

    position()
        .then_ignore(token(Category::KwData))
        .then(con_ident().labelled("type constructor"))
        .then(var_ident().repeated())
        .then(constrs)
        .map(|(((position, name), params), constrs)| Decl::Data(position, name, params, constrs))
}

fn constr_decl(ty: Parser<TypeExpr>) -> Parser<ConstrDecl> {
    enum PlainTail {
        Fields(Vec<FieldDecl>),
        Args(Vec<TypeExpr>),
    }

    let field_decl = position()
        .then(var_ident().separated_by1(token(Category::Comma)))
        .then_ignore(token(Category::ColonColon).labelled("::"))
        .then(ty.clone())
        .map(|((position, labels), ty)| FieldDecl { position, labels, ty });
    let fields = token(Category::LBrace)
        .ignore_then(field_decl.separated_by(token(Category::Comma)))
        .then_ignore(token(Category::RBrace).labelled("}"))
        .map(PlainTail::Fields);

    let plain = position()
        .then(con_ident())
        .then(fields.or(atomic_type(ty.clone()).repeated().map(PlainTail::Args)))
        .map(|((position, name), tail)| match tail {
            PlainTail::Fields(fields) => ConstrDecl::Record(position, vec![], name, fields),
            PlainTail::Args(args) => ConstrDecl::Constr(position, vec![], name, args),
        });

    let con_op = token(Category::ConSym)
        .map(|t| match &t.kind {
            TokenKind::ConSym(s) => Ident::new(s.clone(), t.position.clone()),
            _ => unreachable!(),
        })
        .or(token(Category::Colon).map(|t| Ident::new(":", t.position.clone())));
    let infix = position()
        .then(app_type(ty.clone()))
        .then(con_op)
        .then(app_type(ty))
        .map(|(((position, left), op), right)| ConstrDecl::Op(position, vec![], left, op, right));

    plain.or_longest(infix)
}

fn newtype_decl(ty: Parser<TypeExpr>) -> Parser<Decl> {
    enum Tail {
        Record(Ident, TypeExpr),
        Plain(TypeExpr),
    }

    let record = token(Category::LBrace)
        .ignore_then(var_ident())
        .then_ignore(token(Category::ColonColon).labelled("::"))
        .then(ty.clone())
        .then_ignore(token(Category::RBrace).labelled("}"))
        .map(|(label, ty)| Tail::Record(label, ty));
    let plain_tail = atomic_type(ty).map(Tail::Plain);

    position()
        .then_ignore(token(Category::KwNewtype))
        .then(con_ident().labelled("type constructor"))
        .then(var_ident().repeated())
        .then_ignore(token(Category::Equals).labelled("="))
        .then(position().then(con_ident()).then(record.or(plain_tail)))
        .map(|(((position, name), params), ((con_position, con_name), tail))| {
            let constructor = match tail {
                Tail::Record(label, field_ty) => {
                    NewConstrDecl::NewRecord(con_position, con_name, label, field_ty)
                }
                Tail::Plain(field_ty) => NewConstrDecl::NewConstr(con_position, con_name, field_ty),
            };
            Decl::Newtype(position, name, params, constructor)
        })
}

fn type_synonym_decl(ty: Parser<TypeExpr>) -> Parser<Decl> {
    position()
        .then_ignore(token(Category::KwType))
        .then(con_ident().labelled("type constructor"))
        .then(var_ident().repeated())
        .then_ignore(token(Category::Equals).labelled("="))
        .then(ty)
        .map(|(((position, name), params), body)| Decl::TypeSyn(position, name, params, body))
}

fn foreign_decl(ty: Parser<TypeExpr>) -> Parser<Decl> {
    let call_conv = choice(vec![
        token(Category::IdCcall).map(|_| CallConv::CCall),
        token(Category::IdPrimitive).map(|_| CallConv::Primitive),
    ])
    .or_not()
    .map(|conv| conv.unwrap_or(CallConv::CCall));

    let entity = token(Category::String)
        .map(|t| match t.kind {
            TokenKind::String(s) => s,
            _ => unreachable!(),
        })
        .or_not();

    position()
        .then_ignore(token(Category::KwForeign))
        .then_ignore(token(Category::KwImport).labelled("import"))
        .then(call_conv)
        .then(entity)
        .then(var_ident().labelled("identifier"))
        .then_ignore(token(Category::ColonColon).labelled("::"))
        .then(ty)
        .map(|((((position, conv), entity), name), ty)| {
            Decl::Foreign(position, conv, entity, name, ty)
        })
}

// ============================================================================
// Modules
// ============================================================================

enum Item {
    Import(ImportDecl),
    Decl(Decl),
}

/// The complete module parser, including the end-of-file token.
pub(crate) fn module() -> Parser<Module> {
    let ty = type_expr();
    let pat = pattern();
    let expr = expression(pat.clone(), ty.clone());
    let decl = declaration(expr, pat, ty);

    let item = import_decl().map(Item::Import).or(decl.map(Item::Decl));
    let body = layout(item.separated_by(semi())).try_map(split_items);

    let header = token(Category::KwModule)
        .ignore_then(module_ident().labelled("module name"))
        .then(export_spec().or_not())
        .then_ignore(token(Category::KwWhere).labelled("where"));

    let with_header = header
        .then(body.clone())
        .map(|((name, exports), (imports, decls))| (name, exports, imports, decls));
    let headerless = body.map(|(imports, decls)| (ModuleIdent::main(), None, imports, decls));

    position()
        .then(module_pragma().repeated())
        .then(with_header.or(headerless))
        .then_ignore(token(Category::Eof))
        .map(|((position, pragmas), (name, exports, imports, decls))| Module {
            position,
            pragmas,
            name,
            exports,
            imports,
            decls,
        })
}

/// Imports must precede all other declarations.
fn split_items(items: Vec<Item>) -> Result<(Vec<ImportDecl>, Vec<Decl>), ParseError> {
    let mut imports = Vec::new();
    let mut decls: Vec<Decl> = Vec::new();
    for item in items {
        match item {
            Item::Import(import) => {
                if decls.is_empty() {
                    imports.push(import);
                } else {
                    return Err(ParseError::Expected {
                        label: "declaration".to_string(),
                        position: import.position,
                        span: Span::DUMMY.into(),
                    });
                }
            }
            Item::Decl(decl) => decls.push(decl),
        }
    }
    Ok((imports, decls))
}

fn module_pragma() -> Parser<ModulePragma> {
    let extension = con_ident().or(var_ident()).map(|id| {
        match KnownExtension::from_name(id.name()) {
            Some(known) => Extension::Known(id.position(), known),
            None => Extension::Unknown(id.position(), id.name().clone()),
        }
    });

    let language = token(Category::PragmaLanguage)
        .then(extension.separated_by1(token(Category::Comma)))
        .then_ignore(token(Category::PragmaEnd).labelled("#-}"))
        .map(|(t, extensions)| ModulePragma::Language(t.position.clone(), extensions));

    let options = token(Category::PragmaOptions)
        .then_ignore(token(Category::PragmaEnd).labelled("#-}"))
        .map(|t| match &t.kind {
            TokenKind::PragmaOptions { tool, args } => ModulePragma::Options(
                t.position.clone(),
                tool.as_ref().map(|name| Tool::from_name(name)),
                args.clone(),
            ),
            _ => unreachable!(),
        });

    language.or(options)
}

fn export_spec() -> Parser<ExportSpec> {
    let type_tail = token(Category::LParen).ignore_then(
        token(Category::DotDot)
            .ignore_then(token(Category::RParen).labelled(")"))
            .map(|_| None)
            .or(con_ident()
                .or(var_ident())
                .separated_by(token(Category::Comma))
                .then_ignore(token(Category::RParen).labelled(")"))
                .map(Some)),
    );

    let export = choice(vec![
        token(Category::KwModule)
            .ignore_then(module_ident().labelled("module name"))
            .map(Export::Module),
        qvar().map(Export::Var),
        qcon().then(type_tail.or_not()).map(|(name, tail)| match tail {
            None => Export::Var(name),
            Some(None) => Export::TypeAll(name),
            Some(Some(members)) => Export::TypeWith(name, members),
        }),
        token(Category::LParen)
            .ignore_then(op_ident())
            .then_ignore(token(Category::RParen).labelled(")"))
            .map(|op| Export::Var(plain(op))),
    ]);

    position()
        .then_ignore(token(Category::LParen))
        .then(export.separated_by(token(Category::Comma)))
        .then_ignore(token(Category::RParen).labelled(")"))
        .map(|(position, exports)| ExportSpec { position, exports })
}

fn import_decl() -> Parser<ImportDecl> {
    let import_item = choice(vec![
        var_ident().map(Import::Var),
        con_ident().then(import_type_tail().or_not()).map(|(name, tail)| match tail {
            None => Import::Var(name),
            Some(None) => Import::TypeAll(name),
            Some(Some(members)) => Import::TypeWith(name, members),
        }),
        token(Category::LParen)
            .ignore_then(op_ident())
            .then_ignore(token(Category::RParen).labelled(")"))
            .map(Import::Var),
    ]);

    let item_list = token(Category::LParen)
        .ignore_then(import_item.separated_by(token(Category::Comma)))
        .then_ignore(token(Category::RParen).labelled(")"));

    let spec = position()
        .then_ignore(token(Category::IdHiding))
        .then(item_list.clone())
        .map(|(position, imports)| ImportSpec::Hiding(position, imports))
        .or(position()
            .then(item_list)
            .map(|(position, imports)| ImportSpec::Importing(position, imports)));

    position()
        .then_ignore(token(Category::KwImport))
        .then(token(Category::IdQualified).or_not().map(|q| q.is_some()))
        .then(module_ident().labelled("module name"))
        .then(token(Category::IdAs).ignore_then(module_ident().labelled("module name")).or_not())
        .then(spec.or_not())
        .map(|((((position, qualified), module), alias), spec)| ImportDecl {
            position,
            module,
            qualified,
            alias,
            spec,
        })
}

fn import_type_tail() -> Parser<Option<Vec<Ident>>> {
    token(Category::LParen).ignore_then(
        token(Category::DotDot)
            .ignore_then(token(Category::RParen).labelled(")"))
            .map(|_| None)
            .or(con_ident()
                .or(var_ident())
                .separated_by(token(Category::Comma))
                .then_ignore(token(Category::RParen).labelled(")"))
                .map(Some)),
    )
}

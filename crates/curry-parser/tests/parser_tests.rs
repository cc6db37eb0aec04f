//! End-to-end tests for the parsing pipeline.

use curry_parser::parse_module;
use curry_syntax::ast::*;
use curry_syntax::literal::Literal;

fn parse(source: &str) -> Module {
    match parse_module("Test.curry", source) {
        Ok((module, _)) => module,
        Err(message) => panic!("parse failed: {message}"),
    }
}

fn parse_err(source: &str) -> String {
    match parse_module("Test.curry", source) {
        Ok(_) => panic!("expected a parse error"),
        Err(message) => message.to_string(),
    }
}

fn var_name(e: &Expression) -> &str {
    match e {
        Expression::Variable(v) => v.name().as_str(),
        other => panic!("expected variable, got {other:?}"),
    }
}

#[test]
fn empty_module() {
    let module = parse("module M where\n");
    assert_eq!(module.name.name(), "M");
    assert!(module.pragmas.is_empty());
    assert!(module.exports.is_none());
    assert!(module.imports.is_empty());
    assert!(module.decls.is_empty());
}

#[test]
fn layout_sensitive_let() {
    let module = parse("f = let x = 1\n        y = 2\n    in x + y\n");
    assert_eq!(module.decls.len(), 1);

    let (name, equations) = match &module.decls[0] {
        Decl::Function(_, name, equations) => (name, equations),
        other => panic!("expected function declaration, got {other:?}"),
    };
    assert_eq!(name.name(), "f");
    assert_eq!(equations.len(), 1);
    assert_eq!(equations[0].lhs, Lhs::Fun(name.clone(), vec![]));

    let body = match &equations[0].rhs {
        Rhs::Simple(_, body, decls) => {
            assert!(decls.is_empty());
            body
        }
        other => panic!("expected simple right-hand side, got {other:?}"),
    };

    let (bindings, inner) = match body {
        Expression::Let(bindings, inner) => (bindings, inner),
        other => panic!("expected let expression, got {other:?}"),
    };
    assert_eq!(bindings.len(), 2);
    for (decl, expected) in bindings.iter().zip(["x", "y"]) {
        match decl {
            Decl::Function(_, name, _) => assert_eq!(name.name(), expected),
            other => panic!("expected binding for {expected}, got {other:?}"),
        }
    }

    match &**inner {
        Expression::InfixApply(lhs, InfixOp::Op(op), rhs) => {
            assert_eq!(var_name(lhs), "x");
            assert_eq!(op.name().as_str(), "+");
            assert_eq!(var_name(rhs), "y");
        }
        other => panic!("expected infix application, got {other:?}"),
    }
}

#[test]
fn literate_adjacency_error() {
    let source = "> f = 1\na comment with no blank line above\n> g = 2\n";
    let error = parse_module("Test.lcurry", source).unwrap_err();
    assert_eq!(
        error.to_string(),
        "Test.lcurry:1.1: Program line is followed by comment line"
    );
}

#[test]
fn operator_left_hand_side() {
    let module = parse("x + y = x\n");
    assert_eq!(module.decls.len(), 1);
    match &module.decls[0] {
        Decl::Function(_, name, equations) => {
            assert_eq!(name.name(), "+");
            match &equations[0].lhs {
                Lhs::Op(Pattern::Variable(l), op, Pattern::Variable(r)) => {
                    assert_eq!(l.name(), "x");
                    assert_eq!(op.name(), "+");
                    assert_eq!(r.name(), "y");
                }
                other => panic!("expected operator left-hand side, got {other:?}"),
            }
            match &equations[0].rhs {
                Rhs::Simple(_, body, _) => assert_eq!(var_name(body), "x"),
                other => panic!("expected simple right-hand side, got {other:?}"),
            }
        }
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn module_name_from_basename() {
    let (module, _) = parse_module("path/to/Queens.curry", "f = 1\n").unwrap();
    assert_eq!(module.name.name(), "Queens");
}

#[test]
fn exports_and_imports() {
    let module = parse(
        "module M (f, T (..), U (C1, C2), module N) where\n\
         import Prelude\n\
         import qualified Data.Map as Map\n\
         import N hiding (g)\n\
         f = 1\n",
    );

    let exports = &module.exports.as_ref().unwrap().exports;
    assert_eq!(exports.len(), 4);
    assert!(matches!(&exports[0], Export::Var(v) if v.name() == "f"));
    assert!(matches!(&exports[1], Export::TypeAll(t) if t.name() == "T"));
    assert!(matches!(&exports[2], Export::TypeWith(t, ms) if t.name() == "U" && ms.len() == 2));
    assert!(matches!(&exports[3], Export::Module(m) if m.name() == "N"));

    assert_eq!(module.imports.len(), 3);
    let qualified = &module.imports[1];
    assert!(qualified.qualified);
    assert_eq!(qualified.module.name(), "Data.Map");
    assert_eq!(qualified.alias.as_ref().unwrap().name(), "Map");
    let hiding = &module.imports[2];
    assert!(matches!(&hiding.spec, Some(ImportSpec::Hiding(_, items)) if items.len() == 1));
}

#[test]
fn import_after_declaration_is_rejected() {
    let error = parse_err("module M where\nf = 1\nimport N\n");
    assert!(error.contains("declaration expected"), "unexpected message: {error}");
}

#[test]
fn data_declarations() {
    let module = parse(
        "data Color = Red | Green | Blue\n\
         data Tree a = Leaf | Node (Tree a) a (Tree a)\n\
         data Pair a b = a :*: b\n\
         data Person = Person { name :: String, age :: Int }\n",
    );
    assert_eq!(module.decls.len(), 4);

    match &module.decls[0] {
        Decl::Data(_, name, params, constrs) => {
            assert_eq!(name.name(), "Color");
            assert!(params.is_empty());
            assert_eq!(constrs.len(), 3);
        }
        other => panic!("expected data declaration, got {other:?}"),
    }

    match &module.decls[1] {
        Decl::Data(_, _, params, constrs) => {
            assert_eq!(params.len(), 1);
            match &constrs[1] {
                ConstrDecl::Constr(_, exist, name, args) => {
                    assert!(exist.is_empty());
                    assert_eq!(name.name(), "Node");
                    assert_eq!(args.len(), 3);
                }
                other => panic!("expected plain constructor, got {other:?}"),
            }
        }
        other => panic!("expected data declaration, got {other:?}"),
    }

    match &module.decls[2] {
        Decl::Data(_, _, _, constrs) => match &constrs[0] {
            ConstrDecl::Op(_, _, _, op, _) => assert_eq!(op.name(), ":*:"),
            other => panic!("expected infix constructor, got {other:?}"),
        },
        other => panic!("expected data declaration, got {other:?}"),
    }

    match &module.decls[3] {
        Decl::Data(_, _, _, constrs) => match &constrs[0] {
            ConstrDecl::Record(_, _, name, fields) => {
                assert_eq!(name.name(), "Person");
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].labels[0].name(), "name");
            }
            other => panic!("expected record constructor, got {other:?}"),
        },
        other => panic!("expected data declaration, got {other:?}"),
    }
}

#[test]
fn type_synonym_and_newtype() {
    let module = parse(
        "type Queue a = [a]\n\
         newtype Age = Age Int\n\
         newtype Name = Name { unName :: String }\n",
    );
    assert!(matches!(&module.decls[0], Decl::TypeSyn(_, n, ps, TypeExpr::List(_)) if n.name() == "Queue" && ps.len() == 1));
    assert!(matches!(&module.decls[1], Decl::Newtype(_, _, _, NewConstrDecl::NewConstr(..))));
    assert!(
        matches!(&module.decls[2], Decl::Newtype(_, _, _, NewConstrDecl::NewRecord(_, _, label, _)) if label.name() == "unName")
    );
}

#[test]
fn signatures_external_and_free() {
    let module = parse(
        "f, g :: Int -> Int\n\
         (+++) :: [a] -> [a] -> [a]\n\
         h external\n\
         main = let x, y free in pair x y\n",
    );
    assert!(matches!(&module.decls[0], Decl::TypeSig(_, names, TypeExpr::Arrow(..)) if names.len() == 2));
    assert!(matches!(&module.decls[1], Decl::TypeSig(_, names, _) if names[0].name() == "+++"));
    assert!(matches!(&module.decls[2], Decl::External(_, names) if names[0].name() == "h"));

    match &module.decls[3] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Let(decls, _), _) => {
                assert!(matches!(&decls[0], Decl::Free(_, vars) if vars.len() == 2));
            }
            other => panic!("expected let with free declaration, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn missing_then_is_reported() {
    let error = parse_err("f = if b x else y\n");
    assert!(error.contains("then expected"), "unexpected message: {error}");
}

#[test]
fn missing_in_is_reported() {
    let error = parse_err("f = let x = 1\n");
    assert!(error.contains("in expected"), "unexpected message: {error}");
}

#[test]
fn case_and_fcase() {
    let module = parse(
        "f x = case x of\n\
         \x20       0 -> 1\n\
         \x20       _ -> 2\n\
         g x = fcase x of\n\
         \x20       y -> y\n",
    );

    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Case(_, case_type, _, alts), _) => {
                assert_eq!(*case_type, CaseType::Rigid);
                assert_eq!(alts.len(), 2);
                assert!(matches!(&alts[0].pattern, Pattern::Literal(Literal::Int(..))));
            }
            other => panic!("expected case expression, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }

    match &module.decls[1] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Case(_, case_type, _, _), _) => {
                assert_eq!(*case_type, CaseType::Flex);
            }
            other => panic!("expected fcase expression, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn do_blocks_and_binds() {
    let module = parse(
        "main = do\n\
         \x20 line <- getLine\n\
         \x20 let n = length line\n\
         \x20 putStrLn (show n)\n",
    );
    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Do(stmts, last), _) => {
                assert_eq!(stmts.len(), 2);
                assert!(matches!(&stmts[0], Statement::Bind(_, Pattern::Variable(v), _) if v.name() == "line"));
                assert!(matches!(&stmts[1], Statement::Decl(_)));
                assert!(matches!(&**last, Expression::Apply(..)));
            }
            other => panic!("expected do block, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn list_comprehension_and_enumerations() {
    let module = parse("xs = [x + 1 | x <- [1 .. 10], even x]\nys = [1, 3 ..]\n");
    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::ListCompr(_, _, qualifiers), _) => {
                assert_eq!(qualifiers.len(), 2);
                assert!(matches!(&qualifiers[0], Statement::Bind(_, _, Expression::EnumFromTo(..))));
                assert!(matches!(&qualifiers[1], Statement::Expr(_)));
            }
            other => panic!("expected list comprehension, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
    match &module.decls[1] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::EnumFromThen(..), _) => {}
            other => panic!("expected enumeration, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn sections_and_operator_references() {
    let module = parse("f = map (1 +) xs\ng = (+ 1)\nh = (+)\np = (,)\n");

    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Apply(inner, _), _) => match &**inner {
                Expression::Apply(_, section) => {
                    assert!(matches!(&**section, Expression::LeftSection(..)));
                }
                other => panic!("expected application, got {other:?}"),
            },
            other => panic!("expected application, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }

    let rhs_of = |decl: &Decl| match decl {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, body, _) => body.clone(),
            other => panic!("expected simple right-hand side, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    };
    assert!(matches!(rhs_of(&module.decls[1]), Expression::RightSection(..)));
    assert!(matches!(rhs_of(&module.decls[2]), Expression::Variable(v) if v.name() == "+"));
    assert!(matches!(rhs_of(&module.decls[3]), Expression::Constructor(c) if c.name() == "(,)"));
}

#[test]
fn negative_literal_pattern() {
    let module = parse("f (-1) = 0\nf 0 = 1\n");
    match &module.decls[0] {
        Decl::Function(_, name, equations) => {
            assert_eq!(name.name(), "f");
            match &equations[0].lhs {
                Lhs::Fun(_, args) => match &args[0] {
                    Pattern::Paren(inner) => {
                        assert!(matches!(&**inner, Pattern::Negative(minus, Literal::Int(..)) if minus.name() == "-"));
                    }
                    other => panic!("expected parenthesized negative literal, got {other:?}"),
                },
                other => panic!("expected prefix left-hand side, got {other:?}"),
            }
        }
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn pattern_bindings_keep_constructor_heads() {
    let module = parse("x : xs = units\nJust y = lookup k m\n");
    assert!(matches!(&module.decls[0], Decl::Pattern(_, Pattern::Infix(_, op, _), _) if op.name() == ":"));
    // An unqualified capitalised head is not a constructor identifier at
    // this point, so it defines a function.
    assert!(matches!(&module.decls[1], Decl::Function(_, name, _) if name.name() == "Just"));
}

#[test]
fn qualified_pattern_binding() {
    let module = parse("f (Prelude.Just x) = x\n");
    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].lhs {
            Lhs::Fun(_, args) => match &args[0] {
                Pattern::Paren(inner) => {
                    assert!(matches!(&**inner, Pattern::Constructor(c, _) if c.is_qualified()));
                }
                other => panic!("expected parenthesized constructor pattern, got {other:?}"),
            },
            other => panic!("expected prefix left-hand side, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn guards_and_where() {
    let module = parse(
        "classify n\n\
         \x20 | n < 0 = negative\n\
         \x20 | otherwise = other\n\
         \x20 where negative = 0\n\
         \x20       other = 1\n",
    );
    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Guarded(_, guards, decls) => {
                assert_eq!(guards.len(), 2);
                assert_eq!(decls.len(), 2);
            }
            other => panic!("expected guarded right-hand side, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn applied_left_hand_side() {
    let module = parse("(f `op` g) x = f (g x)\n");
    match &module.decls[0] {
        Decl::Function(_, name, equations) => {
            assert_eq!(name.name(), "op");
            assert!(matches!(&equations[0].lhs, Lhs::Ap(inner, args) if args.len() == 1 && matches!(&**inner, Lhs::Op(..))));
        }
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn fixity_and_foreign_declarations() {
    let module = parse(
        "infixl 7 *, /\n\
         infixr 5 `cons`\n\
         infix ===\n\
         foreign import ccall \"curry_prim\" prim :: Int -> Int\n",
    );
    assert!(
        matches!(&module.decls[0], Decl::Infix(_, Fixity::InfixL, Some(7), ops) if ops.len() == 2)
    );
    assert!(
        matches!(&module.decls[1], Decl::Infix(_, Fixity::InfixR, Some(5), ops) if ops[0].name() == "cons")
    );
    assert!(matches!(&module.decls[2], Decl::Infix(_, Fixity::Infix, None, _)));
    assert!(
        matches!(&module.decls[3], Decl::Foreign(_, CallConv::CCall, Some(entity), name, _)
            if entity == "curry_prim" && name.name() == "prim")
    );
}

#[test]
fn pragmas_and_extension_warnings() {
    let (module, warnings) = parse_module(
        "Test.curry",
        "{-# LANGUAGE FunctionalPatterns, FancyDoodads #-}\n\
         {-# OPTIONS_PAKCS -O2 #-}\n\
         module M where\n",
    )
    .unwrap();

    match &module.pragmas[0] {
        ModulePragma::Language(_, extensions) => {
            assert!(matches!(&extensions[0], Extension::Known(_, KnownExtension::FunctionalPatterns)));
            assert!(matches!(&extensions[1], Extension::Unknown(_, name) if name == "FancyDoodads"));
        }
        other => panic!("expected language pragma, got {other:?}"),
    }
    match &module.pragmas[1] {
        ModulePragma::Options(_, Some(Tool::Pakcs), args) => assert_eq!(args, "-O2"),
        other => panic!("expected options pragma, got {other:?}"),
    }

    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].to_string().contains("FancyDoodads"));
}

#[test]
fn explicit_braces_disable_layout() {
    let module = parse("f = let { x = 1; y = 2 } in x\n");
    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Let(decls, _), _) => assert_eq!(decls.len(), 2),
            other => panic!("expected let expression, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn lambda_and_typed_expressions() {
    let module = parse("f = \\x y -> (x :: Int)\n");
    match &module.decls[0] {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, Expression::Lambda(_, params, body), _) => {
                assert_eq!(params.len(), 2);
                match &**body {
                    Expression::Paren(inner) => {
                        assert!(matches!(&**inner, Expression::Typed(..)));
                    }
                    other => panic!("expected parenthesized typed expression, got {other:?}"),
                }
            }
            other => panic!("expected lambda, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    }
}

#[test]
fn record_expressions() {
    let module = parse("p = Person { name = n, age = 42 }\nq = p { age = 43 }\n");
    let rhs_of = |decl: &Decl| match decl {
        Decl::Function(_, _, equations) => match &equations[0].rhs {
            Rhs::Simple(_, body, _) => body.clone(),
            other => panic!("expected simple right-hand side, got {other:?}"),
        },
        other => panic!("expected function declaration, got {other:?}"),
    };
    assert!(matches!(rhs_of(&module.decls[0]), Expression::Record(c, fields) if c.name() == "Person" && fields.len() == 2));
    assert!(matches!(rhs_of(&module.decls[1]), Expression::RecordUpdate(_, fields) if fields.len() == 1));
}

#[test]
fn parsing_is_deterministic() {
    let source = "module M where\nf x = case x of\n        0 -> [y | y <- [1 ..]]\n        _ -> []\n";
    let first = parse(source);
    let second = parse(source);
    assert_eq!(first, second);
}

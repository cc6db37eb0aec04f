//! Traversal and rewrite framework for the flat representation.
//!
//! Everything here is built around a single structural fold over
//! expressions, [`fold_expr`] with the [`ExprFolder`] trait: one hook per
//! expression variant plus hooks for branches and typed expressions. The
//! selectors, testers, updaters and renamers below are all expressible in
//! terms of it without further recursion.
//!
//! Variant selectors are partial: applied to the wrong variant they panic
//! with a `Goodies.<operation>: <reason>` message. That failure is reported,
//! not recoverable - it always indicates a broken pass.

use crate::flat::*;
use curry_diagnostics::SrcRef;

// ============================================================================
// The structural fold
// ============================================================================

/// One callback per [`Expr`] variant, plus the two auxiliary callbacks for
/// branches and type annotations. Subexpression results are computed before
/// the corresponding hook runs.
pub trait ExprFolder {
    type Out;
    type BranchOut;

    fn variable(&mut self, index: VarIndex) -> Self::Out;
    fn literal(&mut self, literal: &Literal) -> Self::Out;
    fn comb(&mut self, comb_type: CombType, name: &QName, args: Vec<Self::Out>) -> Self::Out;
    fn let_expr(&mut self, bindings: Vec<(VarIndex, Self::Out)>, body: Self::Out) -> Self::Out;
    fn free(&mut self, vars: &[VarIndex], body: Self::Out) -> Self::Out;
    fn or(&mut self, left: Self::Out, right: Self::Out) -> Self::Out;
    fn case(
        &mut self,
        src_ref: &SrcRef,
        case_type: CaseType,
        scrutinee: Self::Out,
        branches: Vec<Self::BranchOut>,
    ) -> Self::Out;
    fn branch(&mut self, pattern: &Pattern, expr: Self::Out) -> Self::BranchOut;
    fn typed(&mut self, expr: Self::Out, ty: &TypeExpr) -> Self::Out;
}

/// Run a folder over an expression.
pub fn fold_expr<F: ExprFolder>(folder: &mut F, expr: &Expr) -> F::Out {
    match expr {
        Expr::Variable(index) => folder.variable(*index),
        Expr::Literal(literal) => folder.literal(literal),
        Expr::Comb(comb_type, name, args) => {
            let args = args.iter().map(|a| fold_expr(folder, a)).collect();
            folder.comb(*comb_type, name, args)
        }
        Expr::Let(bindings, body) => {
            let bindings = bindings
                .iter()
                .map(|(var, rhs)| (*var, fold_expr(folder, rhs)))
                .collect();
            let body = fold_expr(folder, body);
            folder.let_expr(bindings, body)
        }
        Expr::Free(vars, body) => {
            let body = fold_expr(folder, body);
            folder.free(vars, body)
        }
        Expr::Or(left, right) => {
            let left = fold_expr(folder, left);
            let right = fold_expr(folder, right);
            folder.or(left, right)
        }
        Expr::Case(src_ref, case_type, scrutinee, branches) => {
            let scrutinee = fold_expr(folder, scrutinee);
            let branches = branches
                .iter()
                .map(|b| {
                    let expr = fold_expr(folder, &b.expr);
                    folder.branch(&b.pattern, expr)
                })
                .collect();
            folder.case(src_ref, *case_type, scrutinee, branches)
        }
        Expr::Typed(inner, ty) => {
            let inner = fold_expr(folder, inner);
            folder.typed(inner, ty)
        }
    }
}

// ============================================================================
// Testers
// ============================================================================

impl Expr {
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, Expr::Variable(_))
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    #[must_use]
    pub fn is_comb(&self) -> bool {
        matches!(self, Expr::Comb(..))
    }

    #[must_use]
    pub fn is_let(&self) -> bool {
        matches!(self, Expr::Let(..))
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        matches!(self, Expr::Free(..))
    }

    #[must_use]
    pub fn is_or(&self) -> bool {
        matches!(self, Expr::Or(..))
    }

    #[must_use]
    pub fn is_case(&self) -> bool {
        matches!(self, Expr::Case(..))
    }

    #[must_use]
    pub fn is_typed(&self) -> bool {
        matches!(self, Expr::Typed(..))
    }
}

impl Rule {
    #[must_use]
    pub fn is_defined(&self) -> bool {
        matches!(self, Rule::Defined { .. })
    }

    #[must_use]
    pub fn is_external(&self) -> bool {
        matches!(self, Rule::External { .. })
    }

    #[must_use]
    pub fn is_hidden(&self) -> bool {
        matches!(self, Rule::Hidden)
    }
}

impl TypeDecl {
    #[must_use]
    pub fn is_algebraic(&self) -> bool {
        matches!(self, TypeDecl::Algebraic { .. })
    }

    #[must_use]
    pub fn is_synonym(&self) -> bool {
        matches!(self, TypeDecl::Synonym { .. })
    }
}

impl TypeExpr {
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self, TypeExpr::Variable(_))
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(self, TypeExpr::Constructor(..))
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        matches!(self, TypeExpr::Function(..))
    }
}

impl Pattern {
    #[must_use]
    pub fn is_constructor(&self) -> bool {
        matches!(self, Pattern::Constructor(..))
    }

    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(self, Pattern::Literal(_))
    }
}

impl CombType {
    #[must_use]
    pub fn is_func_call(&self) -> bool {
        matches!(self, CombType::FuncCall)
    }

    #[must_use]
    pub fn is_cons_call(&self) -> bool {
        matches!(self, CombType::ConsCall)
    }

    #[must_use]
    pub fn is_partial(&self) -> bool {
        matches!(self, CombType::FuncPartCall(_) | CombType::ConsPartCall(_))
    }

    /// The number of missing arguments of a partial application.
    #[must_use]
    pub fn missing(&self) -> usize {
        match self {
            CombType::FuncPartCall(n) | CombType::ConsPartCall(n) => *n,
            _ => 0,
        }
    }
}

// ============================================================================
// Variant selectors
// ============================================================================

impl Expr {
    /// The index of a variable expression.
    #[must_use]
    pub fn var_index(&self) -> VarIndex {
        match self {
            Expr::Variable(index) => *index,
            _ => panic!("Goodies.var_index: not a variable"),
        }
    }

    /// The literal of a literal expression.
    #[must_use]
    pub fn literal_value(&self) -> &Literal {
        match self {
            Expr::Literal(literal) => literal,
            _ => panic!("Goodies.literal_value: not a literal"),
        }
    }

    #[must_use]
    pub fn comb_type(&self) -> CombType {
        match self {
            Expr::Comb(comb_type, ..) => *comb_type,
            _ => panic!("Goodies.comb_type: not a combination"),
        }
    }

    #[must_use]
    pub fn comb_name(&self) -> &QName {
        match self {
            Expr::Comb(_, name, _) => name,
            _ => panic!("Goodies.comb_name: not a combination"),
        }
    }

    #[must_use]
    pub fn comb_args(&self) -> &[Expr] {
        match self {
            Expr::Comb(_, _, args) => args,
            _ => panic!("Goodies.comb_args: not a combination"),
        }
    }

    #[must_use]
    pub fn let_bindings(&self) -> &[(VarIndex, Expr)] {
        match self {
            Expr::Let(bindings, _) => bindings,
            _ => panic!("Goodies.let_bindings: not a let expression"),
        }
    }

    #[must_use]
    pub fn let_body(&self) -> &Expr {
        match self {
            Expr::Let(_, body) => body,
            _ => panic!("Goodies.let_body: not a let expression"),
        }
    }

    /// The variables introduced by a free declaration.
    #[must_use]
    pub fn free_binders(&self) -> &[VarIndex] {
        match self {
            Expr::Free(vars, _) => vars,
            _ => panic!("Goodies.free_binders: not a free declaration"),
        }
    }

    #[must_use]
    pub fn free_body(&self) -> &Expr {
        match self {
            Expr::Free(_, body) => body,
            _ => panic!("Goodies.free_body: not a free declaration"),
        }
    }

    #[must_use]
    pub fn or_left(&self) -> &Expr {
        match self {
            Expr::Or(left, _) => left,
            _ => panic!("Goodies.or_left: not a choice"),
        }
    }

    #[must_use]
    pub fn or_right(&self) -> &Expr {
        match self {
            Expr::Or(_, right) => right,
            _ => panic!("Goodies.or_right: not a choice"),
        }
    }

    #[must_use]
    pub fn case_type(&self) -> CaseType {
        match self {
            Expr::Case(_, case_type, ..) => *case_type,
            _ => panic!("Goodies.case_type: not a case expression"),
        }
    }

    #[must_use]
    pub fn case_scrutinee(&self) -> &Expr {
        match self {
            Expr::Case(_, _, scrutinee, _) => scrutinee,
            _ => panic!("Goodies.case_scrutinee: not a case expression"),
        }
    }

    #[must_use]
    pub fn case_branches(&self) -> &[Branch] {
        match self {
            Expr::Case(_, _, _, branches) => branches,
            _ => panic!("Goodies.case_branches: not a case expression"),
        }
    }

    #[must_use]
    pub fn typed_expr(&self) -> &Expr {
        match self {
            Expr::Typed(inner, _) => inner,
            _ => panic!("Goodies.typed_expr: not a typed expression"),
        }
    }

    #[must_use]
    pub fn typed_type(&self) -> &TypeExpr {
        match self {
            Expr::Typed(_, ty) => ty,
            _ => panic!("Goodies.typed_type: not a typed expression"),
        }
    }
}

impl Rule {
    /// The parameters of a defined rule.
    #[must_use]
    pub fn params(&self) -> &[VarIndex] {
        match self {
            Rule::Defined { params, .. } => params,
            Rule::External { .. } => panic!("Goodies.params: rule is external"),
            Rule::Hidden => panic!("Goodies.params: rule is hidden"),
        }
    }

    /// The body of a defined rule.
    #[must_use]
    pub fn body(&self) -> &Expr {
        match self {
            Rule::Defined { body, .. } => body,
            Rule::External { .. } => panic!("Goodies.body: rule is external"),
            Rule::Hidden => panic!("Goodies.body: rule is hidden"),
        }
    }

    /// The entity name of an external rule.
    #[must_use]
    pub fn external_name(&self) -> &str {
        match self {
            Rule::External { name } => name,
            _ => panic!("Goodies.external_name: rule is not external"),
        }
    }
}

impl TypeDecl {
    /// The name; total over both variants.
    #[must_use]
    pub fn name(&self) -> &QName {
        match self {
            TypeDecl::Algebraic { name, .. } | TypeDecl::Synonym { name, .. } => name,
        }
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        match self {
            TypeDecl::Algebraic { visibility, .. } | TypeDecl::Synonym { visibility, .. } => {
                *visibility
            }
        }
    }

    #[must_use]
    pub fn params(&self) -> &[VarIndex] {
        match self {
            TypeDecl::Algebraic { params, .. } | TypeDecl::Synonym { params, .. } => params,
        }
    }

    /// The constructors of an algebraic declaration.
    #[must_use]
    pub fn constructors(&self) -> &[ConsDecl] {
        match self {
            TypeDecl::Algebraic { constructors, .. } => constructors,
            TypeDecl::Synonym { .. } => panic!("Goodies.constructors: type is a synonym"),
        }
    }

    /// The right-hand side of a synonym.
    #[must_use]
    pub fn synonym_body(&self) -> &TypeExpr {
        match self {
            TypeDecl::Synonym { body, .. } => body,
            TypeDecl::Algebraic { .. } => panic!("Goodies.synonym_body: type is algebraic"),
        }
    }
}

impl TypeExpr {
    #[must_use]
    pub fn var_index(&self) -> VarIndex {
        match self {
            TypeExpr::Variable(index) => *index,
            _ => panic!("Goodies.var_index: not a type variable"),
        }
    }

    #[must_use]
    pub fn constructor_name(&self) -> &QName {
        match self {
            TypeExpr::Constructor(name, _) => name,
            _ => panic!("Goodies.constructor_name: not a type constructor"),
        }
    }

    #[must_use]
    pub fn constructor_args(&self) -> &[TypeExpr] {
        match self {
            TypeExpr::Constructor(_, args) => args,
            _ => panic!("Goodies.constructor_args: not a type constructor"),
        }
    }

    #[must_use]
    pub fn domain(&self) -> &TypeExpr {
        match self {
            TypeExpr::Function(domain, _) => domain,
            _ => panic!("Goodies.domain: not a function type"),
        }
    }

    #[must_use]
    pub fn range(&self) -> &TypeExpr {
        match self {
            TypeExpr::Function(_, range) => range,
            _ => panic!("Goodies.range: not a function type"),
        }
    }
}

impl Pattern {
    #[must_use]
    pub fn constructor_name(&self) -> &QName {
        match self {
            Pattern::Constructor(name, _) => name,
            _ => panic!("Goodies.constructor_name: not a constructor pattern"),
        }
    }

    /// The variables bound by a constructor pattern.
    #[must_use]
    pub fn binders(&self) -> &[VarIndex] {
        match self {
            Pattern::Constructor(_, vars) => vars,
            _ => panic!("Goodies.binders: not a constructor pattern"),
        }
    }

    #[must_use]
    pub fn literal_value(&self) -> &Literal {
        match self {
            Pattern::Literal(literal) => literal,
            _ => panic!("Goodies.literal_value: not a literal pattern"),
        }
    }

    /// All variables bound by this pattern (empty for literals).
    #[must_use]
    pub fn bound_vars(&self) -> &[VarIndex] {
        match self {
            Pattern::Constructor(_, vars) => vars,
            Pattern::Literal(_) => &[],
        }
    }
}

// ============================================================================
// Updaters
// ============================================================================

impl Prog {
    #[must_use]
    pub fn update_module(mut self, f: impl FnOnce(smol_str::SmolStr) -> smol_str::SmolStr) -> Self {
        self.module = f(self.module);
        self
    }

    #[must_use]
    pub fn update_imports(mut self, f: impl FnOnce(Vec<smol_str::SmolStr>) -> Vec<smol_str::SmolStr>) -> Self {
        self.imports = f(self.imports);
        self
    }

    #[must_use]
    pub fn update_type_decls(mut self, f: impl FnOnce(Vec<TypeDecl>) -> Vec<TypeDecl>) -> Self {
        self.type_decls = f(self.type_decls);
        self
    }

    #[must_use]
    pub fn update_func_decls(mut self, f: impl FnOnce(Vec<FuncDecl>) -> Vec<FuncDecl>) -> Self {
        self.func_decls = f(self.func_decls);
        self
    }

    #[must_use]
    pub fn update_op_decls(mut self, f: impl FnOnce(Vec<OpDecl>) -> Vec<OpDecl>) -> Self {
        self.op_decls = f(self.op_decls);
        self
    }

    /// Lift an expression rewriter through every function body.
    #[must_use]
    pub fn update_exprs(self, f: &impl Fn(Expr) -> Expr) -> Self {
        self.update_func_decls(|funcs| {
            funcs
                .into_iter()
                .map(|func| func.update_rule(|rule| rule.update_body(f)))
                .collect()
        })
    }
}

impl FuncDecl {
    #[must_use]
    pub fn update_name(mut self, f: impl FnOnce(QName) -> QName) -> Self {
        self.name = f(self.name);
        self
    }

    #[must_use]
    pub fn update_arity(mut self, f: impl FnOnce(usize) -> usize) -> Self {
        self.arity = f(self.arity);
        self
    }

    #[must_use]
    pub fn update_visibility(mut self, f: impl FnOnce(Visibility) -> Visibility) -> Self {
        self.visibility = f(self.visibility);
        self
    }

    #[must_use]
    pub fn update_type(mut self, f: impl FnOnce(TypeExpr) -> TypeExpr) -> Self {
        self.ty = f(self.ty);
        self
    }

    #[must_use]
    pub fn update_rule(mut self, f: impl FnOnce(Rule) -> Rule) -> Self {
        self.rule = f(self.rule);
        self
    }
}

impl Rule {
    /// Apply a rewriter to the body of a defined rule; external and hidden
    /// rules are unchanged.
    #[must_use]
    pub fn update_body(self, f: &impl Fn(Expr) -> Expr) -> Self {
        match self {
            Rule::Defined { params, body } => Rule::Defined { params, body: f(body) },
            other => other,
        }
    }
}

impl ConsDecl {
    #[must_use]
    pub fn update_name(mut self, f: impl FnOnce(QName) -> QName) -> Self {
        self.name = f(self.name);
        self
    }

    #[must_use]
    pub fn update_arity(mut self, f: impl FnOnce(usize) -> usize) -> Self {
        self.arity = f(self.arity);
        self
    }

    #[must_use]
    pub fn update_visibility(mut self, f: impl FnOnce(Visibility) -> Visibility) -> Self {
        self.visibility = f(self.visibility);
        self
    }

    #[must_use]
    pub fn update_arg_types(mut self, f: impl FnOnce(Vec<TypeExpr>) -> Vec<TypeExpr>) -> Self {
        self.arg_types = f(self.arg_types);
        self
    }
}

impl OpDecl {
    #[must_use]
    pub fn update_name(mut self, f: impl FnOnce(QName) -> QName) -> Self {
        self.name = f(self.name);
        self
    }

    #[must_use]
    pub fn update_fixity(mut self, f: impl FnOnce(Fixity) -> Fixity) -> Self {
        self.fixity = f(self.fixity);
        self
    }

    #[must_use]
    pub fn update_precedence(mut self, f: impl FnOnce(u32) -> u32) -> Self {
        self.precedence = f(self.precedence);
        self
    }
}

impl Branch {
    #[must_use]
    pub fn update_pattern(mut self, f: impl FnOnce(Pattern) -> Pattern) -> Self {
        self.pattern = f(self.pattern);
        self
    }

    #[must_use]
    pub fn update_expr(mut self, f: impl FnOnce(Expr) -> Expr) -> Self {
        self.expr = f(self.expr);
        self
    }
}

// ============================================================================
// Qualified-name rewriting and module renaming
// ============================================================================

struct UpdQNames<'f, F: Fn(&QName) -> QName> {
    f: &'f F,
}

impl<F: Fn(&QName) -> QName> ExprFolder for UpdQNames<'_, F> {
    type Out = Expr;
    type BranchOut = Branch;

    fn variable(&mut self, index: VarIndex) -> Expr {
        Expr::Variable(index)
    }

    fn literal(&mut self, literal: &Literal) -> Expr {
        Expr::Literal(literal.clone())
    }

    fn comb(&mut self, comb_type: CombType, name: &QName, args: Vec<Expr>) -> Expr {
        Expr::Comb(comb_type, (self.f)(name), args)
    }

    fn let_expr(&mut self, bindings: Vec<(VarIndex, Expr)>, body: Expr) -> Expr {
        Expr::Let(bindings, Box::new(body))
    }

    fn free(&mut self, vars: &[VarIndex], body: Expr) -> Expr {
        Expr::Free(vars.to_vec(), Box::new(body))
    }

    fn or(&mut self, left: Expr, right: Expr) -> Expr {
        Expr::Or(Box::new(left), Box::new(right))
    }

    fn case(
        &mut self,
        src_ref: &SrcRef,
        case_type: CaseType,
        scrutinee: Expr,
        branches: Vec<Branch>,
    ) -> Expr {
        Expr::Case(src_ref.clone(), case_type, Box::new(scrutinee), branches)
    }

    fn branch(&mut self, pattern: &Pattern, expr: Expr) -> Branch {
        let pattern = match pattern {
            Pattern::Constructor(name, vars) => {
                Pattern::Constructor((self.f)(name), vars.clone())
            }
            Pattern::Literal(literal) => Pattern::Literal(literal.clone()),
        };
        Branch { pattern, expr }
    }

    fn typed(&mut self, expr: Expr, ty: &TypeExpr) -> Expr {
        Expr::Typed(Box::new(expr), update_type_qnames(self.f, ty))
    }
}

fn update_type_qnames<F: Fn(&QName) -> QName>(f: &F, ty: &TypeExpr) -> TypeExpr {
    match ty {
        TypeExpr::Variable(index) => TypeExpr::Variable(*index),
        TypeExpr::Constructor(name, args) => TypeExpr::Constructor(
            f(name),
            args.iter().map(|a| update_type_qnames(f, a)).collect(),
        ),
        TypeExpr::Function(domain, range) => TypeExpr::Function(
            Box::new(update_type_qnames(f, domain)),
            Box::new(update_type_qnames(f, range)),
        ),
    }
}

impl Expr {
    /// Rewrite every qualified name in this expression. Variable indices are
    /// untouched.
    #[must_use]
    pub fn update_qnames(&self, f: &impl Fn(&QName) -> QName) -> Expr {
        fold_expr(&mut UpdQNames { f }, self)
    }
}

impl Prog {
    /// Rewrite every qualified name occurrence in the program: type
    /// declarations, constructors, type expressions, function signatures,
    /// operator declarations, combination heads and case-branch constructor
    /// patterns. Variable indices are untouched.
    #[must_use]
    pub fn update_qnames(&self, f: &impl Fn(&QName) -> QName) -> Prog {
        let type_decls = self
            .type_decls
            .iter()
            .map(|decl| match decl {
                TypeDecl::Algebraic { name, visibility, params, constructors } => {
                    TypeDecl::Algebraic {
                        name: f(name),
                        visibility: *visibility,
                        params: params.clone(),
                        constructors: constructors
                            .iter()
                            .map(|c| ConsDecl {
                                name: f(&c.name),
                                arity: c.arity,
                                visibility: c.visibility,
                                arg_types: c
                                    .arg_types
                                    .iter()
                                    .map(|t| update_type_qnames(f, t))
                                    .collect(),
                            })
                            .collect(),
                    }
                }
                TypeDecl::Synonym { name, visibility, params, body } => TypeDecl::Synonym {
                    name: f(name),
                    visibility: *visibility,
                    params: params.clone(),
                    body: update_type_qnames(f, body),
                },
            })
            .collect();

        let func_decls = self
            .func_decls
            .iter()
            .map(|func| FuncDecl {
                name: f(&func.name),
                arity: func.arity,
                visibility: func.visibility,
                ty: update_type_qnames(f, &func.ty),
                rule: match &func.rule {
                    Rule::Defined { params, body } => Rule::Defined {
                        params: params.clone(),
                        body: body.update_qnames(f),
                    },
                    Rule::External { name } => Rule::External { name: name.clone() },
                    Rule::Hidden => Rule::Hidden,
                },
            })
            .collect();

        let op_decls = self
            .op_decls
            .iter()
            .map(|op| OpDecl {
                name: f(&op.name),
                fixity: op.fixity,
                precedence: op.precedence,
            })
            .collect();

        Prog {
            module: self.module.clone(),
            imports: self.imports.clone(),
            type_decls,
            func_decls,
            op_decls,
        }
    }

    /// Rename the program: set its module name and redirect every qualified
    /// name whose module component equals the old name. Foreign qualifiers
    /// are untouched.
    #[must_use]
    pub fn rename(&self, new_name: impl Into<smol_str::SmolStr>) -> Prog {
        let new_name = new_name.into();
        let old_name = self.module.clone();
        let renamed = self.update_qnames(&|qname: &QName| {
            if qname.module == old_name {
                QName::new(new_name.clone(), qname.name.clone())
            } else {
                qname.clone()
            }
        });
        renamed.update_module(|_| new_name)
    }
}

// ============================================================================
// Variable renumbering
// ============================================================================

struct Renumber<'f, F: Fn(VarIndex) -> VarIndex> {
    f: &'f F,
}

impl<F: Fn(VarIndex) -> VarIndex> ExprFolder for Renumber<'_, F> {
    type Out = Expr;
    type BranchOut = Branch;

    fn variable(&mut self, index: VarIndex) -> Expr {
        Expr::Variable((self.f)(index))
    }

    fn literal(&mut self, literal: &Literal) -> Expr {
        Expr::Literal(literal.clone())
    }

    fn comb(&mut self, comb_type: CombType, name: &QName, args: Vec<Expr>) -> Expr {
        Expr::Comb(comb_type, name.clone(), args)
    }

    fn let_expr(&mut self, bindings: Vec<(VarIndex, Expr)>, body: Expr) -> Expr {
        let bindings = bindings
            .into_iter()
            .map(|(var, rhs)| ((self.f)(var), rhs))
            .collect();
        Expr::Let(bindings, Box::new(body))
    }

    fn free(&mut self, vars: &[VarIndex], body: Expr) -> Expr {
        Expr::Free(vars.iter().map(|v| (self.f)(*v)).collect(), Box::new(body))
    }

    fn or(&mut self, left: Expr, right: Expr) -> Expr {
        Expr::Or(Box::new(left), Box::new(right))
    }

    fn case(
        &mut self,
        src_ref: &SrcRef,
        case_type: CaseType,
        scrutinee: Expr,
        branches: Vec<Branch>,
    ) -> Expr {
        Expr::Case(src_ref.clone(), case_type, Box::new(scrutinee), branches)
    }

    fn branch(&mut self, pattern: &Pattern, expr: Expr) -> Branch {
        let pattern = match pattern {
            Pattern::Constructor(name, vars) => Pattern::Constructor(
                name.clone(),
                vars.iter().map(|v| (self.f)(*v)).collect(),
            ),
            Pattern::Literal(literal) => Pattern::Literal(literal.clone()),
        };
        Branch { pattern, expr }
    }

    fn typed(&mut self, expr: Expr, ty: &TypeExpr) -> Expr {
        Expr::Typed(Box::new(expr), ty.clone())
    }
}

/// Map every variable index occurrence - binders and uses alike - through
/// `f`, preserving structure and scoping.
#[must_use]
pub fn renumber_vars(f: &impl Fn(VarIndex) -> VarIndex, expr: &Expr) -> Expr {
    fold_expr(&mut Renumber { f }, expr)
}

impl Rule {
    /// Renumber the parameters and body of a defined rule.
    #[must_use]
    pub fn renumber_vars(&self, f: &impl Fn(VarIndex) -> VarIndex) -> Rule {
        match self {
            Rule::Defined { params, body } => Rule::Defined {
                params: params.iter().map(|v| f(*v)).collect(),
                body: renumber_vars(f, body),
            },
            other => other.clone(),
        }
    }
}

// ============================================================================
// Free variables
// ============================================================================

struct FreeVars;

fn without(mut vars: Vec<VarIndex>, bound: &[VarIndex]) -> Vec<VarIndex> {
    vars.retain(|v| !bound.contains(v));
    vars
}

impl ExprFolder for FreeVars {
    type Out = Vec<VarIndex>;
    type BranchOut = Vec<VarIndex>;

    fn variable(&mut self, index: VarIndex) -> Vec<VarIndex> {
        vec![index]
    }

    fn literal(&mut self, _literal: &Literal) -> Vec<VarIndex> {
        Vec::new()
    }

    fn comb(&mut self, _: CombType, _: &QName, args: Vec<Vec<VarIndex>>) -> Vec<VarIndex> {
        args.into_iter().flatten().collect()
    }

    fn let_expr(
        &mut self,
        bindings: Vec<(VarIndex, Vec<VarIndex>)>,
        body: Vec<VarIndex>,
    ) -> Vec<VarIndex> {
        // Bindings are recursive: the bound variables scope over the
        // right-hand sides as well as the body.
        let bound: Vec<VarIndex> = bindings.iter().map(|(v, _)| *v).collect();
        let mut vars: Vec<VarIndex> = bindings.into_iter().flat_map(|(_, vs)| vs).collect();
        vars.extend(body);
        without(vars, &bound)
    }

    fn free(&mut self, vars: &[VarIndex], body: Vec<VarIndex>) -> Vec<VarIndex> {
        without(body, vars)
    }

    fn or(&mut self, mut left: Vec<VarIndex>, right: Vec<VarIndex>) -> Vec<VarIndex> {
        left.extend(right);
        left
    }

    fn case(
        &mut self,
        _: &SrcRef,
        _: CaseType,
        mut scrutinee: Vec<VarIndex>,
        branches: Vec<Vec<VarIndex>>,
    ) -> Vec<VarIndex> {
        scrutinee.extend(branches.into_iter().flatten());
        scrutinee
    }

    fn branch(&mut self, pattern: &Pattern, expr: Vec<VarIndex>) -> Vec<VarIndex> {
        without(expr, pattern.bound_vars())
    }

    fn typed(&mut self, expr: Vec<VarIndex>, _: &TypeExpr) -> Vec<VarIndex> {
        expr
    }
}

/// The free variables of an expression, in order of first occurrence.
#[must_use]
pub fn free_vars(expr: &Expr) -> Vec<VarIndex> {
    let mut vars = fold_expr(&mut FreeVars, expr);
    let mut seen = Vec::with_capacity(vars.len());
    vars.retain(|v| {
        if seen.contains(v) {
            false
        } else {
            seen.push(*v);
            true
        }
    });
    vars
}

// ============================================================================
// Normal-form predicates
// ============================================================================

impl Expr {
    /// Weak head normal form: a literal, or any combination that is not a
    /// saturated function call.
    #[must_use]
    pub fn is_whnf(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Comb(comb_type, ..) => !comb_type.is_func_call(),
            _ => false,
        }
    }

    /// Ground: a literal, or a saturated constructor call whose arguments
    /// are all ground.
    #[must_use]
    pub fn is_ground(&self) -> bool {
        match self {
            Expr::Literal(_) => true,
            Expr::Comb(CombType::ConsCall, _, args) => args.iter().all(Expr::is_ground),
            _ => false,
        }
    }
}

// ============================================================================
// Type of an expression
// ============================================================================

fn prelude_type(name: &str) -> TypeExpr {
    TypeExpr::Constructor(QName::new("Prelude", name), vec![])
}

/// Compute the type of an expression, given the recorded types of variables
/// and of function/constructor names. Returns `None` where the type is
/// unknown (e.g. a head applied to more arguments than its type has
/// arrows).
#[must_use]
pub fn type_of(
    expr: &Expr,
    var_type: &impl Fn(VarIndex) -> Option<TypeExpr>,
    name_type: &impl Fn(&QName) -> Option<TypeExpr>,
) -> Option<TypeExpr> {
    match expr {
        Expr::Variable(index) => var_type(*index),
        Expr::Literal(Literal::Int(..)) => Some(prelude_type("Int")),
        Expr::Literal(Literal::Float(..)) => Some(prelude_type("Float")),
        Expr::Literal(Literal::Char(..)) => Some(prelude_type("Char")),
        Expr::Comb(_, name, args) => {
            // Peel one domain per supplied argument.
            let mut ty = name_type(name)?;
            for _ in args {
                match ty {
                    TypeExpr::Function(_, range) => ty = *range,
                    _ => return None,
                }
            }
            Some(ty)
        }
        Expr::Let(_, body) | Expr::Free(_, body) => type_of(body, var_type, name_type),
        Expr::Or(left, right) => type_of(left, var_type, name_type)
            .or_else(|| type_of(right, var_type, name_type)),
        Expr::Case(_, _, _, branches) => branches
            .iter()
            .find_map(|b| type_of(&b.expr, var_type, name_type)),
        Expr::Typed(_, ty) => Some(ty.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curry_syntax::ident::Ident;
    use num_bigint::BigInt;

    fn int(n: i64) -> Expr {
        Expr::Literal(Literal::Int(Ident::unpositioned("_"), BigInt::from(n)))
    }

    fn call(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Comb(CombType::FuncCall, QName::new("Prelude", name), args)
    }

    fn cons(name: &str, args: Vec<Expr>) -> Expr {
        Expr::Comb(CombType::ConsCall, QName::new("Prelude", name), args)
    }

    /// `let x = y in x + z` with x = 1, y = 2, z = 3.
    fn let_example() -> Expr {
        Expr::Let(
            vec![(1, Expr::Variable(2))],
            Box::new(call("+", vec![Expr::Variable(1), Expr::Variable(3)])),
        )
    }

    #[test]
    fn test_free_vars_of_let() {
        assert_eq!(free_vars(&let_example()), vec![2, 3]);
    }

    #[test]
    fn test_free_vars_scoping() {
        // free a, b in case b of { C x -> x ; _pattern-less via literal }
        let expr = Expr::Free(
            vec![4],
            Box::new(Expr::Case(
                SrcRef::none(),
                CaseType::Flex,
                Box::new(Expr::Variable(4)),
                vec![
                    Branch {
                        pattern: Pattern::Constructor(QName::new("Prelude", "C"), vec![5]),
                        expr: call("+", vec![Expr::Variable(5), Expr::Variable(6)]),
                    },
                    Branch {
                        pattern: Pattern::Literal(Literal::Char(SrcRef::none(), 'a')),
                        expr: Expr::Variable(7),
                    },
                ],
            )),
        );
        assert_eq!(free_vars(&expr), vec![6, 7]);
    }

    #[test]
    fn test_free_vars_invariant_under_identity_renumbering() {
        let expr = let_example();
        let renumbered = renumber_vars(&|v| v, &expr);
        assert_eq!(free_vars(&renumbered), free_vars(&expr));
        assert_eq!(renumbered, expr);
    }

    #[test]
    fn test_renumbering_composes() {
        let expr = let_example();
        let f = |v: VarIndex| v + 1;
        let g = |v: VarIndex| v * 2;
        let composed = renumber_vars(&|v| g(f(v)), &expr);
        let sequential = renumber_vars(&g, &renumber_vars(&f, &expr));
        assert_eq!(composed, sequential);
    }

    fn example_prog() -> Prog {
        Prog {
            module: "Foo".into(),
            imports: vec!["Prelude".into(), "Baz".into()],
            type_decls: vec![TypeDecl::Algebraic {
                name: QName::new("Foo", "T"),
                visibility: Visibility::Public,
                params: vec![0],
                constructors: vec![ConsDecl {
                    name: QName::new("Foo", "MkT"),
                    arity: 1,
                    visibility: Visibility::Public,
                    arg_types: vec![TypeExpr::Variable(0)],
                }],
            }],
            func_decls: vec![FuncDecl {
                name: QName::new("Foo", "f"),
                arity: 1,
                visibility: Visibility::Public,
                ty: TypeExpr::Function(
                    Box::new(prelude_type("Int")),
                    Box::new(prelude_type("Int")),
                ),
                rule: Rule::Defined {
                    params: vec![1],
                    body: Expr::Comb(
                        CombType::FuncCall,
                        QName::new("Foo", "bar"),
                        vec![Expr::Comb(
                            CombType::FuncCall,
                            QName::new("Baz", "bar"),
                            vec![Expr::Variable(1)],
                        )],
                    ),
                },
            }],
            op_decls: vec![OpDecl {
                name: QName::new("Foo", "<+>"),
                fixity: Fixity::InfixL,
                precedence: 6,
            }],
        }
    }

    #[test]
    fn test_rename_program() {
        let prog = example_prog();
        let renamed = prog.rename("Qux");

        assert_eq!(renamed.module, "Qux");
        assert_eq!(renamed.type_decls[0].name(), &QName::new("Qux", "T"));
        assert_eq!(renamed.op_decls[0].name, QName::new("Qux", "<+>"));

        let body = renamed.func_decls[0].rule.body();
        assert_eq!(body.comb_name(), &QName::new("Qux", "bar"));
        // The foreign qualifier is untouched.
        assert_eq!(body.comb_args()[0].comb_name(), &QName::new("Baz", "bar"));
    }

    #[test]
    fn test_rename_to_same_name_is_identity() {
        let prog = example_prog();
        assert_eq!(prog.rename("Foo"), prog);
    }

    #[test]
    fn test_update_qnames_composes() {
        let prog = example_prog();
        let f = |q: &QName| QName::new(q.module.clone(), format!("{}_f", q.name));
        let g = |q: &QName| QName::new(q.module.clone(), format!("{}_g", q.name));
        let composed = prog.update_qnames(&|q| g(&f(q)));
        let sequential = prog.update_qnames(&f).update_qnames(&g);
        assert_eq!(composed, sequential);
    }

    #[test]
    fn test_ground_implies_whnf() {
        let candidates = vec![
            int(1),
            cons("Just", vec![int(2)]),
            cons("Just", vec![Expr::Variable(0)]),
            call("f", vec![int(1)]),
            Expr::Comb(CombType::FuncPartCall(1), QName::new("Prelude", "f"), vec![]),
            Expr::Variable(3),
            let_example(),
        ];
        for e in &candidates {
            if e.is_ground() {
                assert!(e.is_whnf(), "ground expression not in whnf: {e:?}");
            }
        }
        assert!(cons("Just", vec![int(2)]).is_ground());
        assert!(!cons("Just", vec![Expr::Variable(0)]).is_ground());
        // A partial function call is whnf but not ground.
        let partial = Expr::Comb(CombType::FuncPartCall(1), QName::new("Prelude", "f"), vec![]);
        assert!(partial.is_whnf());
        assert!(!partial.is_ground());
        assert!(!call("f", vec![int(1)]).is_whnf());
    }

    #[test]
    fn test_type_of() {
        let int_to_int_to_int = TypeExpr::Function(
            Box::new(prelude_type("Int")),
            Box::new(TypeExpr::Function(
                Box::new(prelude_type("Int")),
                Box::new(prelude_type("Int")),
            )),
        );
        let name_type = |q: &QName| {
            if q.name == "+" {
                Some(int_to_int_to_int.clone())
            } else {
                None
            }
        };
        let var_type = |_: VarIndex| Some(prelude_type("Int"));

        assert_eq!(type_of(&int(1), &var_type, &name_type), Some(prelude_type("Int")));

        let application = call("+", vec![int(1), int(2)]);
        assert_eq!(type_of(&application, &var_type, &name_type), Some(prelude_type("Int")));

        let partial = Expr::Comb(
            CombType::FuncPartCall(1),
            QName::new("Prelude", "+"),
            vec![int(1)],
        );
        assert_eq!(
            type_of(&partial, &var_type, &name_type),
            Some(TypeExpr::Function(
                Box::new(prelude_type("Int")),
                Box::new(prelude_type("Int")),
            ))
        );

        // Too many arguments for the recorded type: unknown.
        let over_applied = call("+", vec![int(1), int(2), int(3)]);
        assert_eq!(type_of(&over_applied, &var_type, &name_type), None);

        let annotated = Expr::Typed(Box::new(Expr::Variable(9)), prelude_type("Float"));
        assert_eq!(type_of(&annotated, &var_type, &name_type), Some(prelude_type("Float")));
    }

    #[test]
    fn test_selectors_succeed_on_matching_variants() {
        let e = let_example();
        assert!(e.is_let());
        assert_eq!(e.let_bindings().len(), 1);
        assert_eq!(e.let_body().comb_name(), &QName::new("Prelude", "+"));

        let rule = Rule::Defined { params: vec![1, 2], body: int(0) };
        assert!(rule.is_defined());
        assert_eq!(rule.params(), &[1, 2]);

        let external = Rule::External { name: "prim_plus".to_string() };
        assert_eq!(external.external_name(), "prim_plus");
    }

    #[test]
    #[should_panic(expected = "Goodies.var_index: not a variable")]
    fn test_var_index_panics_on_literal() {
        let _ = int(1).var_index();
    }

    #[test]
    #[should_panic(expected = "Goodies.params: rule is external")]
    fn test_params_panics_on_external() {
        let rule = Rule::External { name: "x".to_string() };
        let _ = rule.params();
    }

    #[test]
    #[should_panic(expected = "Goodies.constructors: type is a synonym")]
    fn test_constructors_panics_on_synonym() {
        let synonym = TypeDecl::Synonym {
            name: QName::new("M", "S"),
            visibility: Visibility::Private,
            params: vec![],
            body: prelude_type("Int"),
        };
        let _ = synonym.constructors();
    }

    #[test]
    fn test_update_exprs_reaches_function_bodies() {
        let prog = example_prog();
        let rewritten = prog.update_exprs(&|e| renumber_vars(&|v| v + 10, &e));
        assert_eq!(
            free_vars(rewritten.func_decls[0].rule.body()),
            vec![11]
        );
    }

    #[test]
    fn test_fold_counts_nodes() {
        struct Count;
        impl ExprFolder for Count {
            type Out = usize;
            type BranchOut = usize;
            fn variable(&mut self, _: VarIndex) -> usize {
                1
            }
            fn literal(&mut self, _: &Literal) -> usize {
                1
            }
            fn comb(&mut self, _: CombType, _: &QName, args: Vec<usize>) -> usize {
                1 + args.into_iter().sum::<usize>()
            }
            fn let_expr(&mut self, bindings: Vec<(VarIndex, usize)>, body: usize) -> usize {
                1 + bindings.into_iter().map(|(_, n)| n).sum::<usize>() + body
            }
            fn free(&mut self, _: &[VarIndex], body: usize) -> usize {
                1 + body
            }
            fn or(&mut self, left: usize, right: usize) -> usize {
                1 + left + right
            }
            fn case(&mut self, _: &SrcRef, _: CaseType, scrutinee: usize, branches: Vec<usize>) -> usize {
                1 + scrutinee + branches.into_iter().sum::<usize>()
            }
            fn branch(&mut self, _: &Pattern, expr: usize) -> usize {
                expr
            }
            fn typed(&mut self, expr: usize, _: &TypeExpr) -> usize {
                1 + expr
            }
        }
        // let x = y in x + z: let + var + comb + var + var
        assert_eq!(fold_expr(&mut Count, &let_example()), 5);
    }
}

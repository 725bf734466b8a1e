//! Pre-order traversal that flattens a program into the nodes the analyses
//! care about.
//!
//! Every pass of the analyzer (bindings, loops, imports, evals) reads the
//! same flattened list, so a unit is walked exactly once.

use oxc_ast::ast::*;

use crate::error::AnalyzeError;

/// Maximum syntactic depth the walker follows before giving up.
///
/// Brackets are already bounded by the pre-parse scan, but long operator
/// chains (`a+a+a+...`) nest without any.
const MAX_TREE_DEPTH: usize = 512;

/// A node of interest, in source (pre-)order.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Node<'t, 'a> {
    Declarator(&'t VariableDeclarator<'a>),
    Object(&'t ObjectExpression<'a>),
    Call(&'t CallExpression<'a>),
    Import(&'t ImportExpression<'a>),
    While(&'t WhileStatement<'a>),
    DoWhile(&'t DoWhileStatement<'a>),
    For(&'t ForStatement<'a>),
}

/// Flatten `program` into its interesting nodes.
pub(crate) fn collect_nodes<'t, 'a>(
    program: &'t Program<'a>,
) -> Result<Vec<Node<'t, 'a>>, AnalyzeError> {
    let mut walker = Walker {
        nodes: Vec::new(),
        depth: 0,
    };
    walker.statements(&program.body)?;
    Ok(walker.nodes)
}

struct Walker<'t, 'a> {
    nodes: Vec<Node<'t, 'a>>,
    depth: usize,
}

impl<'t, 'a> Walker<'t, 'a> {
    fn enter(&mut self) -> Result<(), AnalyzeError> {
        self.depth += 1;
        if self.depth > MAX_TREE_DEPTH {
            return Err(AnalyzeError::NestingTooDeep {
                max: MAX_TREE_DEPTH,
                actual: self.depth,
            });
        }
        Ok(())
    }

    fn statements(&mut self, body: &'t [Statement<'a>]) -> Result<(), AnalyzeError> {
        for stmt in body {
            self.statement(stmt)?;
        }
        Ok(())
    }

    fn statement(&mut self, stmt: &'t Statement<'a>) -> Result<(), AnalyzeError> {
        self.enter()?;
        let result = self.walk_statement(stmt);
        self.depth -= 1;
        result
    }

    fn expression(&mut self, expr: &'t Expression<'a>) -> Result<(), AnalyzeError> {
        self.enter()?;
        let result = self.walk_expression(expr);
        self.depth -= 1;
        result
    }

    fn opt_expression(&mut self, expr: &'t Option<Expression<'a>>) -> Result<(), AnalyzeError> {
        match expr {
            Some(expr) => self.expression(expr),
            None => Ok(()),
        }
    }

    fn walk_statement(&mut self, stmt: &'t Statement<'a>) -> Result<(), AnalyzeError> {
        match stmt {
            Statement::ExpressionStatement(es) => self.expression(&es.expression),
            Statement::BlockStatement(block) => self.statements(&block.body),
            Statement::IfStatement(ifs) => {
                self.expression(&ifs.test)?;
                self.statement(&ifs.consequent)?;
                if let Some(alt) = &ifs.alternate {
                    self.statement(alt)?;
                }
                Ok(())
            }
            Statement::ReturnStatement(ret) => self.opt_expression(&ret.argument),
            Statement::VariableDeclaration(decl) => self.declaration(decl),
            Statement::ForStatement(fors) => {
                self.nodes.push(Node::For(fors));
                if let Some(init) = &fors.init {
                    match init {
                        ForStatementInit::VariableDeclaration(decl) => self.declaration(decl)?,
                        _ => {
                            if let Some(expr) = init.as_expression() {
                                self.expression(expr)?;
                            }
                        }
                    }
                }
                self.opt_expression(&fors.test)?;
                self.opt_expression(&fors.update)?;
                self.statement(&fors.body)
            }
            Statement::ForInStatement(fis) => {
                self.for_left(&fis.left)?;
                self.expression(&fis.right)?;
                self.statement(&fis.body)
            }
            Statement::ForOfStatement(fos) => {
                self.for_left(&fos.left)?;
                self.expression(&fos.right)?;
                self.statement(&fos.body)
            }
            Statement::WhileStatement(ws) => {
                self.nodes.push(Node::While(ws));
                self.expression(&ws.test)?;
                self.statement(&ws.body)
            }
            Statement::DoWhileStatement(dws) => {
                self.nodes.push(Node::DoWhile(dws));
                self.statement(&dws.body)?;
                self.expression(&dws.test)
            }
            Statement::WithStatement(ws) => {
                self.expression(&ws.object)?;
                self.statement(&ws.body)
            }
            Statement::SwitchStatement(ss) => {
                self.expression(&ss.discriminant)?;
                for case in &ss.cases {
                    self.opt_expression(&case.test)?;
                    self.statements(&case.consequent)?;
                }
                Ok(())
            }
            Statement::TryStatement(ts) => {
                self.statements(&ts.block.body)?;
                if let Some(handler) = &ts.handler {
                    if let Some(param) = &handler.param {
                        self.pattern(&param.pattern)?;
                    }
                    self.statements(&handler.body.body)?;
                }
                if let Some(finalizer) = &ts.finalizer {
                    self.statements(&finalizer.body)?;
                }
                Ok(())
            }
            Statement::ThrowStatement(ts) => self.expression(&ts.argument),
            Statement::LabeledStatement(ls) => self.statement(&ls.body),
            Statement::FunctionDeclaration(fd) => self.function(fd),
            Statement::ClassDeclaration(cd) => self.class(cd),
            // Break, continue, empty, debugger, module and type declarations
            _ => Ok(()),
        }
    }

    fn declaration(&mut self, decl: &'t VariableDeclaration<'a>) -> Result<(), AnalyzeError> {
        for declarator in &decl.declarations {
            self.nodes.push(Node::Declarator(declarator));
            self.pattern(&declarator.id)?;
            self.opt_expression(&declarator.init)?;
        }
        Ok(())
    }

    /// The head of `for..in` / `for..of`. Its declarators have no
    /// initializer, so only their patterns are walked.
    fn for_left(&mut self, left: &'t ForStatementLeft<'a>) -> Result<(), AnalyzeError> {
        match left {
            ForStatementLeft::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    self.pattern(&declarator.id)?;
                }
                Ok(())
            }
            _ => match left.as_assignment_target() {
                Some(target) => self.assignment_target(target),
                None => Ok(()),
            },
        }
    }

    fn function(&mut self, func: &'t Function<'a>) -> Result<(), AnalyzeError> {
        self.params(&func.params)?;
        if let Some(body) = &func.body {
            self.statements(&body.statements)?;
        }
        Ok(())
    }

    fn params(&mut self, params: &'t FormalParameters<'a>) -> Result<(), AnalyzeError> {
        for param in &params.items {
            self.decorators(&param.decorators)?;
            self.pattern(&param.pattern)?;
        }
        match &params.rest {
            Some(rest) => self.pattern(&rest.argument),
            None => Ok(()),
        }
    }

    fn pattern(&mut self, pattern: &'t BindingPattern<'a>) -> Result<(), AnalyzeError> {
        self.enter()?;
        let result = self.walk_pattern(pattern);
        self.depth -= 1;
        result
    }

    fn walk_pattern(&mut self, pattern: &'t BindingPattern<'a>) -> Result<(), AnalyzeError> {
        match &pattern.kind {
            BindingPatternKind::BindingIdentifier(_) => Ok(()),
            BindingPatternKind::ObjectPattern(obj) => {
                for prop in &obj.properties {
                    self.property_key(&prop.key, prop.computed)?;
                    self.pattern(&prop.value)?;
                }
                match &obj.rest {
                    Some(rest) => self.pattern(&rest.argument),
                    None => Ok(()),
                }
            }
            BindingPatternKind::ArrayPattern(arr) => {
                for elem in arr.elements.iter().flatten() {
                    self.pattern(elem)?;
                }
                match &arr.rest {
                    Some(rest) => self.pattern(&rest.argument),
                    None => Ok(()),
                }
            }
            BindingPatternKind::AssignmentPattern(assign) => {
                self.pattern(&assign.left)?;
                self.expression(&assign.right)
            }
        }
    }

    fn assignment_target(&mut self, target: &'t AssignmentTarget<'a>) -> Result<(), AnalyzeError> {
        self.enter()?;
        let result = self.walk_assignment_target(target);
        self.depth -= 1;
        result
    }

    fn walk_assignment_target(
        &mut self,
        target: &'t AssignmentTarget<'a>,
    ) -> Result<(), AnalyzeError> {
        if let Some(member) = target.as_member_expression() {
            return self.member_object(member);
        }
        match target.as_assignment_target_pattern() {
            Some(AssignmentTargetPattern::ArrayAssignmentTarget(arr)) => {
                for elem in arr.elements.iter().flatten() {
                    self.maybe_default(elem)?;
                }
                match &arr.rest {
                    Some(rest) => self.assignment_target(&rest.target),
                    None => Ok(()),
                }
            }
            Some(AssignmentTargetPattern::ObjectAssignmentTarget(obj)) => {
                for prop in &obj.properties {
                    match prop {
                        AssignmentTargetProperty::AssignmentTargetPropertyIdentifier(p) => {
                            self.opt_expression(&p.init)?
                        }
                        AssignmentTargetProperty::AssignmentTargetPropertyProperty(p) => {
                            if let Some(key) = p.name.as_expression() {
                                self.expression(key)?;
                            }
                            self.maybe_default(&p.binding)?;
                        }
                    }
                }
                match &obj.rest {
                    Some(rest) => self.assignment_target(&rest.target),
                    None => Ok(()),
                }
            }
            // Plain identifiers
            None => Ok(()),
        }
    }

    fn maybe_default(
        &mut self,
        target: &'t AssignmentTargetMaybeDefault<'a>,
    ) -> Result<(), AnalyzeError> {
        match target {
            AssignmentTargetMaybeDefault::AssignmentTargetWithDefault(with_default) => {
                self.assignment_target(&with_default.binding)?;
                self.expression(&with_default.init)
            }
            _ => match target.as_assignment_target() {
                Some(target) => self.assignment_target(target),
                None => Ok(()),
            },
        }
    }

    fn property_key(&mut self, key: &'t PropertyKey<'a>, computed: bool) -> Result<(), AnalyzeError> {
        match key.as_expression() {
            Some(expr) if computed => self.expression(expr),
            _ => Ok(()),
        }
    }

    fn decorators(&mut self, decorators: &'t [Decorator<'a>]) -> Result<(), AnalyzeError> {
        for decorator in decorators {
            self.expression(&decorator.expression)?;
        }
        Ok(())
    }

    fn class(&mut self, class: &'t Class<'a>) -> Result<(), AnalyzeError> {
        self.decorators(&class.decorators)?;
        self.opt_expression(&class.super_class)?;
        for element in &class.body.body {
            match element {
                ClassElement::MethodDefinition(md) => {
                    self.decorators(&md.decorators)?;
                    self.property_key(&md.key, md.computed)?;
                    self.function(&md.value)?;
                }
                ClassElement::PropertyDefinition(pd) => {
                    self.decorators(&pd.decorators)?;
                    self.property_key(&pd.key, pd.computed)?;
                    self.opt_expression(&pd.value)?;
                }
                ClassElement::AccessorProperty(ap) => {
                    self.decorators(&ap.decorators)?;
                    self.property_key(&ap.key, ap.computed)?;
                    self.opt_expression(&ap.value)?;
                }
                ClassElement::StaticBlock(sb) => self.statements(&sb.body)?,
                // TypeScript index signatures
                _ => {}
            }
        }
        Ok(())
    }

    fn call(&mut self, call: &'t CallExpression<'a>) -> Result<(), AnalyzeError> {
        self.nodes.push(Node::Call(call));
        self.expression(&call.callee)?;
        self.arguments(&call.arguments)
    }

    fn arguments(&mut self, args: &'t [Argument<'a>]) -> Result<(), AnalyzeError> {
        for arg in args {
            match arg {
                Argument::SpreadElement(spread) => self.expression(&spread.argument)?,
                _ => {
                    if let Some(expr) = arg.as_expression() {
                        self.expression(expr)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn member_object(&mut self, member: &'t MemberExpression<'a>) -> Result<(), AnalyzeError> {
        match member {
            MemberExpression::StaticMemberExpression(m) => self.expression(&m.object),
            MemberExpression::ComputedMemberExpression(m) => {
                self.expression(&m.object)?;
                self.expression(&m.expression)
            }
            MemberExpression::PrivateFieldExpression(pf) => self.expression(&pf.object),
        }
    }

    fn walk_expression(&mut self, expr: &'t Expression<'a>) -> Result<(), AnalyzeError> {
        match expr {
            Expression::CallExpression(call) => self.call(call),
            Expression::NewExpression(new_expr) => {
                self.expression(&new_expr.callee)?;
                self.arguments(&new_expr.arguments)
            }
            Expression::ImportExpression(imp) => {
                self.nodes.push(Node::Import(imp));
                self.expression(&imp.source)?;
                for option in &imp.arguments {
                    self.expression(option)?;
                }
                Ok(())
            }
            Expression::StaticMemberExpression(member) => self.expression(&member.object),
            Expression::ComputedMemberExpression(member) => {
                self.expression(&member.object)?;
                self.expression(&member.expression)
            }
            Expression::PrivateFieldExpression(pf) => self.expression(&pf.object),
            Expression::TaggedTemplateExpression(tagged) => {
                self.expression(&tagged.tag)?;
                for expr in &tagged.quasi.expressions {
                    self.expression(expr)?;
                }
                Ok(())
            }
            Expression::ArrowFunctionExpression(arrow) => {
                self.params(&arrow.params)?;
                self.statements(&arrow.body.statements)
            }
            Expression::FunctionExpression(func) => self.function(func),
            Expression::ClassExpression(class) => self.class(class),
            Expression::AssignmentExpression(assign) => {
                self.assignment_target(&assign.left)?;
                self.expression(&assign.right)
            }
            Expression::UpdateExpression(update) => match update.argument.as_member_expression() {
                Some(member) => self.member_object(member),
                None => Ok(()),
            },
            Expression::PrivateInExpression(private_in) => self.expression(&private_in.right),
            Expression::BinaryExpression(bin) => {
                self.expression(&bin.left)?;
                self.expression(&bin.right)
            }
            Expression::LogicalExpression(log) => {
                self.expression(&log.left)?;
                self.expression(&log.right)
            }
            Expression::ConditionalExpression(cond) => {
                self.expression(&cond.test)?;
                self.expression(&cond.consequent)?;
                self.expression(&cond.alternate)
            }
            Expression::UnaryExpression(unary) => self.expression(&unary.argument),
            Expression::SequenceExpression(seq) => {
                for e in &seq.expressions {
                    self.expression(e)?;
                }
                Ok(())
            }
            Expression::ArrayExpression(arr) => {
                for elem in &arr.elements {
                    match elem {
                        ArrayExpressionElement::SpreadElement(spread) => {
                            self.expression(&spread.argument)?
                        }
                        ArrayExpressionElement::Elision(_) => {}
                        _ => {
                            if let Some(expr) = elem.as_expression() {
                                self.expression(expr)?;
                            }
                        }
                    }
                }
                Ok(())
            }
            Expression::ObjectExpression(obj) => {
                self.nodes.push(Node::Object(obj));
                for prop in &obj.properties {
                    match prop {
                        ObjectPropertyKind::ObjectProperty(p) => {
                            if p.computed {
                                if let Some(key) = p.key.as_expression() {
                                    self.expression(key)?;
                                }
                            }
                            self.expression(&p.value)?;
                        }
                        ObjectPropertyKind::SpreadProperty(spread) => {
                            self.expression(&spread.argument)?
                        }
                    }
                }
                Ok(())
            }
            Expression::AwaitExpression(aw) => self.expression(&aw.argument),
            Expression::YieldExpression(y) => self.opt_expression(&y.argument),
            Expression::TemplateLiteral(tl) => {
                for expr in &tl.expressions {
                    self.expression(expr)?;
                }
                Ok(())
            }
            Expression::ParenthesizedExpression(paren) => self.expression(&paren.expression),
            Expression::ChainExpression(chain) => match &chain.expression {
                ChainElement::CallExpression(call) => self.call(call),
                ChainElement::StaticMemberExpression(member) => self.expression(&member.object),
                ChainElement::ComputedMemberExpression(member) => {
                    self.expression(&member.object)?;
                    self.expression(&member.expression)
                }
                ChainElement::PrivateFieldExpression(pf) => self.expression(&pf.object),
                _ => Ok(()),
            },
            // Identifiers, literals, `this`, `super`, meta properties
            _ => Ok(()),
        }
    }
}

//! Recursive-descent parser over the token stream.

use std::rc::Rc;

use crate::ast::{
    AssignmentExpression, CallExpression, Expression, ExpressionStatement, Function, FunctionBody,
    FunctionDeclaration, Identifier, MemberExpression, NumericLiteral, Program, ReturnStatement,
    Statement, StringLiteral,
};
use crate::token::Token;
use crate::tokenizer;

/// Parses an entire program from source text, returning `None` on any
/// tokenizer or grammar failure.
pub fn parse(input: &str) -> Option<Program> {
    let mut tokens = tokenizer::tokenize(input)?;
    debug_assert_eq!(tokens.pop(), Some(Token::Eof));

    let mut tokens: &[Token] = &tokens;
    let mut body = Vec::new();

    while !tokens.is_empty() {
        let stmt = parse_statement(&mut tokens)?;
        body.push(stmt);

        if !tokens.is_empty() {
            if tokens[0] != Token::Semicolon {
                return None;
            }
            tokens = &tokens[1..];
        }
    }

    Some(Program { body })
}

fn parse_statement(tokens: &mut &[Token]) -> Option<Statement> {
    if tokens.first() == Some(&Token::Function) {
        return parse_function_declaration(tokens).map(Statement::FunctionDeclaration);
    }

    if tokens.first() == Some(&Token::Return) {
        *tokens = &tokens[1..];
        let tail = *tokens;
        if tail.is_empty() {
            return None;
        }

        if tail[0] == Token::Semicolon {
            return Some(Statement::ReturnStatement(ReturnStatement { argument: None }));
        }

        let argument = parse_expression(tokens)?;
        return Some(Statement::ReturnStatement(ReturnStatement { argument: Some(argument) }));
    }

    let expr = parse_expression(tokens)?;
    Some(Statement::ExpressionStatement(ExpressionStatement { expression: expr }))
}

struct ParsedFunction {
    name: Option<Identifier>,
    function: Rc<Function>,
}

fn parse_function(tokens: &mut &[Token]) -> Option<ParsedFunction> {
    debug_assert_eq!(tokens.first(), Some(&Token::Function));
    *tokens = &tokens[1..];

    if tokens.is_empty() {
        return None;
    }

    let mut name = None;
    if let Some(Token::Identifier(ident)) = tokens.first() {
        name = Some(Identifier { name: ident.clone() });
        *tokens = &tokens[1..];
    }

    if tokens.first() != Some(&Token::LParen) {
        return None;
    }
    *tokens = &tokens[1..];
    if tokens.is_empty() {
        return None;
    }

    let mut params = Vec::new();
    while let Some(Token::Identifier(ident)) = tokens.first() {
        params.push(Identifier { name: ident.clone() });
        *tokens = &tokens[1..];
        if tokens.is_empty() {
            return None;
        }

        if tokens.first() == Some(&Token::RParen) {
            break;
        }

        if tokens.first() != Some(&Token::Comma) {
            return None;
        }
        *tokens = &tokens[1..];
        if tokens.is_empty() {
            return None;
        }
    }

    if tokens.first() != Some(&Token::RParen) {
        return None;
    }
    *tokens = &tokens[1..];

    if tokens.first() != Some(&Token::LBrace) {
        return None;
    }
    *tokens = &tokens[1..];
    if tokens.is_empty() {
        return None;
    }

    let mut body = Vec::new();
    while tokens.first() != Some(&Token::RBrace) {
        let stmt = parse_statement(tokens)?;
        body.push(stmt);

        if tokens.is_empty() {
            return None;
        }

        if tokens.first() == Some(&Token::Semicolon) {
            *tokens = &tokens[1..];
            if tokens.is_empty() {
                return None;
            }
        } else if tokens.first() != Some(&Token::RBrace) {
            return None;
        }
    }

    debug_assert_eq!(tokens.first(), Some(&Token::RBrace));
    *tokens = &tokens[1..];

    Some(ParsedFunction { name, function: Rc::new(Function { params, body: FunctionBody { body } }) })
}

fn parse_function_declaration(tokens: &mut &[Token]) -> Option<FunctionDeclaration> {
    let parsed = parse_function(tokens)?;
    Some(FunctionDeclaration { id: parsed.name?, function: parsed.function })
}

fn parse_expression(tokens: &mut &[Token]) -> Option<Expression> {
    if tokens.is_empty() {
        return None;
    }

    let mut expr = match &tokens[0] {
        Token::IntLiteral(v) => {
            let v = *v;
            *tokens = &tokens[1..];
            Expression::NumericLiteral(NumericLiteral { value: v as f64 })
        }
        Token::StringLiteral(s) => {
            let s = s.clone();
            *tokens = &tokens[1..];
            Expression::StringLiteral(StringLiteral { value: s })
        }
        Token::Identifier(name) => {
            let name = name.clone();
            *tokens = &tokens[1..];
            Expression::Identifier(Identifier { name })
        }
        _ => return None,
    };

    loop {
        if tokens.is_empty() {
            return Some(expr);
        }

        match &tokens[0] {
            Token::Period => {
                *tokens = &tokens[1..];
                expr = Expression::MemberExpression(parse_member_expr(Box::new(expr), tokens)?);
            }
            Token::LParen => {
                *tokens = &tokens[1..];
                expr = Expression::CallExpression(parse_call_expr(Box::new(expr), tokens)?);
            }
            Token::Equals => {
                *tokens = &tokens[1..];
                expr = Expression::AssignmentExpression(parse_assign_expr(Box::new(expr), tokens)?);
            }
            _ => return Some(expr),
        }
    }
}

fn parse_call_expr(callee: Box<Expression>, tokens: &mut &[Token]) -> Option<CallExpression> {
    if tokens.is_empty() {
        return None;
    }

    if tokens[0] == Token::RParen {
        *tokens = &tokens[1..];
        return Some(CallExpression { callee, arguments: Vec::new() });
    }

    let mut args = Vec::new();
    loop {
        let arg = parse_expression(tokens)?;
        args.push(arg);

        if tokens.is_empty() {
            return None;
        }

        if tokens[0] == Token::RParen {
            *tokens = &tokens[1..];
            break;
        }

        if tokens[0] != Token::Comma {
            return None;
        }
        *tokens = &tokens[1..];
    }

    Some(CallExpression { callee, arguments: args })
}

fn parse_assign_expr(lhs: Box<Expression>, tokens: &mut &[Token]) -> Option<AssignmentExpression> {
    let value_expr = parse_expression(tokens)?;
    Some(AssignmentExpression { left: lhs, right: Box::new(value_expr) })
}

fn parse_member_expr(object: Box<Expression>, tokens: &mut &[Token]) -> Option<MemberExpression> {
    let Some(Token::Identifier(name)) = tokens.first() else { return None };
    let property = Identifier { name: name.clone() };
    *tokens = &tokens[1..];
    Some(MemberExpression { object, property })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::*;

    #[test]
    fn parses_return_literal() {
        let program = parse("function f() { return 1 }").unwrap();
        assert_eq!(program.body.len(), 1);
        let Statement::FunctionDeclaration(decl) = &program.body[0] else { panic!() };
        assert_eq!(decl.id.name, "f");
        assert_eq!(decl.function.body.body.len(), 1);
    }

    #[test]
    fn parses_call_with_args() {
        let program = parse("foo(1, \"x\", bar)").unwrap();
        let Statement::ExpressionStatement(stmt) = &program.body[0] else { panic!() };
        let Expression::CallExpression(call) = &stmt.expression else { panic!() };
        assert_eq!(call.arguments.len(), 3);
    }

    #[test]
    fn parses_member_and_assignment() {
        let program = parse("a.b = 2").unwrap();
        let Statement::ExpressionStatement(stmt) = &program.body[0] else { panic!() };
        let Expression::AssignmentExpression(assign) = &stmt.expression else { panic!() };
        assert!(matches!(*assign.left, Expression::MemberExpression(_)));
    }

    #[test]
    fn missing_identifier_after_period_fails() {
        assert!(parse("a.1").is_none());
    }

    #[test]
    fn missing_comma_between_arguments_fails() {
        assert!(parse("foo(1 2)").is_none());
    }

    #[test]
    fn trailing_semicolon_optional_after_block() {
        assert!(parse("function f() { return }\nfunction g() { return }").is_some());
    }

    #[test]
    fn anonymous_function_at_statement_level_is_rejected() {
        assert!(parse("function () { return 1 }").is_none());
    }

    #[test]
    fn unexpected_eof_fails() {
        assert!(parse("foo(").is_none());
    }
}

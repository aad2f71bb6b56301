use thiserror::Error;

use crate::{
    frontend::{
        SourceFile,
        ast::{
            BinaryOperatorKind, Expression, ExpressionKind, FunctionDefinition,
            FunctionParameter, Identifier, IncrementKind, Literal, Program, Statement,
            StatementKind,
        },
        lexer::{Keyword, Lexer, Span, Token, TokenKind},
    },
    middle::ty::Type,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Span,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

#[derive(Debug)]
pub struct Parser<'source> {
    source: &'source SourceFile,
    tokens: Vec<Token>,
    position: usize,
}

impl<'source> Parser<'source> {
    pub fn parse_program(source: &'source SourceFile) -> Result<Program, ParseError> {
        let mut parser = Self {
            source,
            tokens: Lexer::new(source).tokenize()?,
            position: 0,
        };

        let mut function_definitions = Vec::new();

        while parser.peek().is_some() {
            function_definitions.push(parser.parse_function_definition()?);
        }

        Ok(Program {
            function_definitions,
        })
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.position).copied()
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    fn peek_nth_kind(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.position + n).map(|t| t.kind)
    }

    fn end_of_file_span(&self) -> Span {
        let end = self.source.contents.len();
        Span::new(end.saturating_sub(1), end)
    }

    fn expect_next(&mut self, expecting: &str) -> Result<Token, ParseError> {
        let Some(token) = self.peek() else {
            return Err(ParseError::new(
                format!("Expected {expecting} but reached end of file"),
                self.end_of_file_span(),
            ));
        };

        self.position += 1;
        Ok(token)
    }

    fn expect_next_to_be(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.expect_next(&format!("{kind:?}"))?;

        if token.kind != kind {
            return Err(ParseError::new(
                format!(
                    "Expected {:?} but found {:?} ({})",
                    kind,
                    token.kind,
                    self.source.value_of_span(token.span)
                ),
                token.span,
            ));
        }

        Ok(token)
    }

    fn next_if(&mut self, kind: TokenKind) -> Option<Token> {
        if self.peek_kind() == Some(kind) {
            self.position += 1;
            return self.tokens.get(self.position - 1).copied();
        }

        None
    }

    fn peek_type(&self) -> Option<Type> {
        match self.peek_kind()? {
            TokenKind::Keyword(keyword) => keyword.as_type(),
            _ => None,
        }
    }

    // int, bool, double, void
    fn parse_type(&mut self) -> Result<(Type, Span), ParseError> {
        let token = self.expect_next("type")?;

        let ty = match token.kind {
            TokenKind::Keyword(keyword) => keyword.as_type(),
            _ => None,
        };

        ty.map(|ty| (ty, token.span)).ok_or_else(|| {
            ParseError::new(
                format!(
                    "Expected type but found `{}`",
                    self.source.value_of_span(token.span)
                ),
                token.span,
            )
        })
    }

    // main
    fn parse_identifier(&mut self) -> Result<Identifier, ParseError> {
        let token = self.expect_next_to_be(TokenKind::Identifier)?;

        Ok(Identifier {
            span: token.span,
            name: self.source.value_of_span(token.span).to_owned(),
        })
    }

    /// type name ( type name, ... ) { statement* }
    fn parse_function_definition(&mut self) -> Result<FunctionDefinition, ParseError> {
        let (return_type, type_span) = self.parse_type()?;
        let name = self.parse_identifier()?;

        self.expect_next_to_be(TokenKind::OpenParen)?;

        let mut parameters = Vec::new();

        // If the next token is not a closing paren, there MUST be at least one
        // parameter
        if self.peek_kind() != Some(TokenKind::CloseParen) {
            parameters.push(self.parse_function_parameter()?);

            while self.next_if(TokenKind::Comma).is_some() {
                parameters.push(self.parse_function_parameter()?);
            }
        }

        self.expect_next_to_be(TokenKind::CloseParen)?;

        let (body, body_span) = self.parse_block()?;

        Ok(FunctionDefinition {
            span: type_span.to(body_span),
            return_type,
            name,
            parameters,
            body,
        })
    }

    // int argc
    fn parse_function_parameter(&mut self) -> Result<FunctionParameter, ParseError> {
        let (ty, type_span) = self.parse_type()?;
        let name = self.parse_identifier()?;

        Ok(FunctionParameter {
            span: type_span.to(name.span),
            ty,
            name,
        })
    }

    // "{" ( statement )* "}"
    fn parse_block(&mut self) -> Result<(Vec<Statement>, Span), ParseError> {
        let open_brace = self.expect_next_to_be(TokenKind::OpenBrace)?;

        let mut statements = Vec::new();

        while self.peek_kind() != Some(TokenKind::CloseBrace) {
            if self.peek().is_none() {
                return Err(ParseError::new(
                    "Expected `}` but reached end of file",
                    open_brace.span,
                ));
            }

            statements.push(self.parse_statement()?);
        }

        let close_brace = self.expect_next_to_be(TokenKind::CloseBrace)?;

        Ok((statements, open_brace.span.to(close_brace.span)))
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let Some(peeked) = self.peek() else {
            return Err(ParseError::new(
                "Expected statement but reached end of file",
                self.end_of_file_span(),
            ));
        };

        if self.peek_type().is_some() {
            return self.parse_declaration();
        }

        match peeked.kind {
            TokenKind::OpenBrace => {
                let (statements, span) = self.parse_block()?;

                Ok(Statement {
                    span,
                    kind: StatementKind::Block(statements),
                })
            }
            TokenKind::Keyword(Keyword::Return) => {
                let return_keyword = self.expect_next("return")?;

                let expression = if self.peek_kind() == Some(TokenKind::Semicolon) {
                    None
                } else {
                    Some(self.parse_expression()?)
                };

                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: return_keyword.span.to(semicolon.span),
                    kind: StatementKind::Return(expression),
                })
            }
            TokenKind::Keyword(Keyword::While) => {
                let while_keyword = self.expect_next("while")?;
                let condition = self.parse_parenthesized_condition()?;
                let body = self.parse_statement()?;

                Ok(Statement {
                    span: while_keyword.span.to(body.span),
                    kind: StatementKind::While {
                        condition,
                        body: Box::new(body),
                    },
                })
            }
            TokenKind::Keyword(Keyword::If) => {
                let if_keyword = self.expect_next("if")?;
                let condition = self.parse_parenthesized_condition()?;
                let positive = self.parse_statement()?;

                self.expect_next_to_be(TokenKind::Keyword(Keyword::Else))?;

                let negative = self.parse_statement()?;

                Ok(Statement {
                    span: if_keyword.span.to(negative.span),
                    kind: StatementKind::IfElse {
                        condition,
                        positive: Box::new(positive),
                        negative: Box::new(negative),
                    },
                })
            }
            _ => {
                let expression = self.parse_expression()?;
                let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

                Ok(Statement {
                    span: expression.span.to(semicolon.span),
                    kind: StatementKind::Expression(expression),
                })
            }
        }
    }

    fn parse_parenthesized_condition(&mut self) -> Result<Expression, ParseError> {
        self.expect_next_to_be(TokenKind::OpenParen)?;
        let condition = self.parse_expression()?;
        self.expect_next_to_be(TokenKind::CloseParen)?;

        Ok(condition)
    }

    /// int x;  int x, y, z;  int x = e;
    fn parse_declaration(&mut self) -> Result<Statement, ParseError> {
        let (ty, type_span) = self.parse_type()?;
        let name = self.parse_identifier()?;

        if self.next_if(TokenKind::Equals).is_some() {
            let initializer = self.parse_expression()?;
            let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

            return Ok(Statement {
                span: type_span.to(semicolon.span),
                kind: StatementKind::Initialization {
                    ty,
                    name,
                    initializer,
                },
            });
        }

        let mut names = vec![name];

        while self.next_if(TokenKind::Comma).is_some() {
            names.push(self.parse_identifier()?);
        }

        let semicolon = self.expect_next_to_be(TokenKind::Semicolon)?;

        Ok(Statement {
            span: type_span.to(semicolon.span),
            kind: StatementKind::Declarations { ty, names },
        })
    }

    /// expression     -> assignment
    /// assignment     -> IDENTIFIER "=" assignment
    ///                   | logical_or
    /// logical_or     -> logical_and ( "||" logical_and )*
    /// logical_and    -> equality ( "&&" equality )*
    /// equality       -> relational ( ( "==" | "!=" ) relational )?
    /// relational     -> term ( ( "<" | "<=" | ">" | ">=" ) term )?
    /// term           -> factor ( ( "+" | "-" ) factor )*
    /// factor         -> prefix ( ( "*" | "/" ) prefix )*
    /// prefix         -> ( "++" | "--" ) IDENTIFIER
    ///                   | postfix
    /// postfix        -> IDENTIFIER ( "++" | "--" )
    ///                   | atom
    /// atom           -> INTEGER | DOUBLE | BOOL
    ///                   | IDENTIFIER ( "(" ( expression ( "," expression )* )? ")" )?
    ///                   | "(" expression ")"
    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_assignment_expression()
    }

    fn parse_assignment_expression(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_logical_or_expression()?;

        if self.peek_kind() != Some(TokenKind::Equals) {
            return Ok(expression);
        }

        let equals = self.expect_next_to_be(TokenKind::Equals)?;

        let ExpressionKind::Identifier(target) = expression.kind else {
            return Err(ParseError::new(
                "Left hand side of an assignment must be a variable",
                expression.span.to(equals.span),
            ));
        };

        let value = self.parse_assignment_expression()?;

        Ok(Expression {
            span: target.span.to(value.span),
            kind: ExpressionKind::Assignment {
                target,
                value: Box::new(value),
            },
        })
    }

    fn parse_logical_or_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_logical_and_expression()?;

        while self.next_if(TokenKind::LogicalOr).is_some() {
            let rhs = self.parse_logical_and_expression()?;
            expression = binary(expression, BinaryOperatorKind::LogicalOr, rhs);
        }

        Ok(expression)
    }

    fn parse_logical_and_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_equality_expression()?;

        while self.next_if(TokenKind::LogicalAnd).is_some() {
            let rhs = self.parse_equality_expression()?;
            expression = binary(expression, BinaryOperatorKind::LogicalAnd, rhs);
        }

        Ok(expression)
    }

    fn parse_equality_expression(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_relational_expression()?;

        if !self.peek_kind().is_some_and(|k| k.is_equality_operator()) {
            return Ok(expression);
        }

        let operator = match self.expect_next("equality operator")?.kind {
            TokenKind::DoubleEquals => BinaryOperatorKind::Equals,
            _ => BinaryOperatorKind::NotEquals,
        };
        let rhs = self.parse_relational_expression()?;

        Ok(binary(expression, operator, rhs))
    }

    fn parse_relational_expression(&mut self) -> Result<Expression, ParseError> {
        let expression = self.parse_term_expression()?;

        if !self.peek_kind().is_some_and(|k| k.is_relational_operator()) {
            return Ok(expression);
        }

        let operator = match self.expect_next("relational operator")?.kind {
            TokenKind::LessThan => BinaryOperatorKind::LessThan,
            TokenKind::LessThanOrEqualTo => BinaryOperatorKind::LessThanOrEqualTo,
            TokenKind::GreaterThan => BinaryOperatorKind::GreaterThan,
            _ => BinaryOperatorKind::GreaterThanOrEqualTo,
        };
        let rhs = self.parse_term_expression()?;

        Ok(binary(expression, operator, rhs))
    }

    fn parse_term_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_factor_expression()?;

        while self.peek_kind().is_some_and(|k| k.is_term_operator()) {
            let operator = match self.expect_next("term operator")?.kind {
                TokenKind::Plus => BinaryOperatorKind::Add,
                _ => BinaryOperatorKind::Subtract,
            };
            let rhs = self.parse_factor_expression()?;
            expression = binary(expression, operator, rhs);
        }

        Ok(expression)
    }

    fn parse_factor_expression(&mut self) -> Result<Expression, ParseError> {
        let mut expression = self.parse_prefix_expression()?;

        while self.peek_kind().is_some_and(|k| k.is_factor_operator()) {
            let operator = match self.expect_next("factor operator")?.kind {
                TokenKind::Asterisk => BinaryOperatorKind::Multiply,
                _ => BinaryOperatorKind::Divide,
            };
            let rhs = self.parse_prefix_expression()?;
            expression = binary(expression, operator, rhs);
        }

        Ok(expression)
    }

    fn parse_prefix_expression(&mut self) -> Result<Expression, ParseError> {
        if !self.peek_kind().is_some_and(|k| k.is_increment_operator()) {
            return self.parse_postfix_expression();
        }

        let operator = self.expect_next("increment operator")?;
        let target = self.parse_identifier()?;

        let kind = if operator.kind == TokenKind::Increment {
            IncrementKind::PreIncrement
        } else {
            IncrementKind::PreDecrement
        };

        Ok(Expression {
            span: operator.span.to(target.span),
            kind: ExpressionKind::Increment { kind, target },
        })
    }

    fn parse_postfix_expression(&mut self) -> Result<Expression, ParseError> {
        let is_postfix = self.peek_kind() == Some(TokenKind::Identifier)
            && self
                .peek_nth_kind(1)
                .is_some_and(|k| k.is_increment_operator());

        if !is_postfix {
            return self.parse_atom();
        }

        let target = self.parse_identifier()?;
        let operator = self.expect_next("increment operator")?;

        let kind = if operator.kind == TokenKind::Increment {
            IncrementKind::PostIncrement
        } else {
            IncrementKind::PostDecrement
        };

        Ok(Expression {
            span: target.span.to(operator.span),
            kind: ExpressionKind::Increment { kind, target },
        })
    }

    fn parse_atom(&mut self) -> Result<Expression, ParseError> {
        let token = self.expect_next("expression")?;
        let text = self.source.value_of_span(token.span);

        let kind = match token.kind {
            TokenKind::BooleanLiteral => ExpressionKind::Literal(Literal::Boolean(text == "true")),
            TokenKind::IntegerLiteral => {
                let value = text.parse::<i32>().map_err(|_| {
                    ParseError::new(
                        format!("Integer literal `{text}` does not fit in 32 bits"),
                        token.span,
                    )
                })?;

                ExpressionKind::Literal(Literal::Integer(value))
            }
            TokenKind::DoubleLiteral => {
                let value = text.parse::<f64>().map_err(|_| {
                    ParseError::new(format!("Invalid double literal `{text}`"), token.span)
                })?;

                ExpressionKind::Literal(Literal::Double(value))
            }
            TokenKind::Identifier => {
                let identifier = Identifier {
                    span: token.span,
                    name: text.to_owned(),
                };

                if self.next_if(TokenKind::OpenParen).is_none() {
                    return Ok(Expression {
                        span: token.span,
                        kind: ExpressionKind::Identifier(identifier),
                    });
                }

                let mut arguments = Vec::new();

                if self.peek_kind() != Some(TokenKind::CloseParen) {
                    arguments.push(self.parse_expression()?);

                    while self.next_if(TokenKind::Comma).is_some() {
                        arguments.push(self.parse_expression()?);
                    }
                }

                let close_paren = self.expect_next_to_be(TokenKind::CloseParen)?;

                return Ok(Expression {
                    span: token.span.to(close_paren.span),
                    kind: ExpressionKind::FunctionCall {
                        target: identifier,
                        arguments,
                    },
                });
            }
            TokenKind::OpenParen => {
                let inner = self.parse_expression()?;
                let close_paren = self.expect_next_to_be(TokenKind::CloseParen)?;

                return Ok(Expression {
                    span: token.span.to(close_paren.span),
                    kind: inner.kind,
                });
            }
            _ => {
                return Err(ParseError::new(
                    format!("Expected expression but found `{text}`"),
                    token.span,
                ));
            }
        };

        Ok(Expression {
            span: token.span,
            kind,
        })
    }
}

fn binary(lhs: Expression, operator: BinaryOperatorKind, rhs: Expression) -> Expression {
    Expression {
        span: lhs.span.to(rhs.span),
        kind: ExpressionKind::Binary {
            lhs: Box::new(lhs),
            operator,
            rhs: Box::new(rhs),
        },
    }
}

//! Error-tolerant recursive-descent parser
//!
//! The parser never fails: it always yields a (possibly partial) tree plus
//! the list of problems it recovered from. Editors query mid-edit
//! constantly, so a missing body or an unclosed list still produces nodes
//! for everything that did parse.
//!
//! An argument slot that is syntactically empty (cursor right after `(` or
//! `,`) produces no node at all; the slot is "about to be typed", not a
//! malformed argument.

use crate::error::ParseError;
use crate::lexer::{Keyword, LexerSnapshot, Token, TokenKind};
use crate::text::Span;
use crate::tree::{BinaryOp, NodeId, NodeKind, SyntaxTree, UnaryOp};

/// Result of parsing one document
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    pub tree: SyntaxTree,
    pub errors: Vec<ParseError>,
}

/// Parse a lexer snapshot into a syntax tree
pub fn parse(snapshot: &LexerSnapshot) -> ParseOutcome {
    Parser::new(snapshot).run()
}

struct Parser<'a> {
    tokens: &'a [Token],
    total: u32,
    pos: usize,
    tree: SyntaxTree,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    fn new(snapshot: &'a LexerSnapshot) -> Self {
        Self {
            tokens: snapshot.tokens(),
            total: snapshot.line_index().total_len(),
            pos: 0,
            tree: SyntaxTree::new(),
            errors: Vec::new(),
        }
    }

    fn run(mut self) -> ParseOutcome {
        let child = if self.at_keyword(Keyword::Section) {
            Some(self.section())
        } else if self.done() {
            None
        } else {
            self.expression()
        };
        if !self.done() {
            self.error("end of input");
        }
        let root = self.tree.push(NodeKind::Document, Span::new(0, self.total));
        self.tree.set_children(root, child.into_iter().collect());
        self.tree.set_root(root);
        ParseOutcome {
            tree: self.tree,
            errors: self.errors,
        }
    }

    // --- token helpers ---

    fn done(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek().map(|token| token.kind == kind).unwrap_or(false)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        self.at(TokenKind::Keyword(keyword))
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, keyword: Keyword) -> bool {
        self.eat(TokenKind::Keyword(keyword))
    }

    /// Span at the current cursor, empty when between tokens
    fn here(&self) -> Span {
        match self.peek() {
            Some(token) => token.span,
            None => Span::new(self.total, self.total),
        }
    }

    /// End offset of the most recently consumed token
    fn last_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }

    fn error(&mut self, expected: &str) {
        let found = self
            .peek()
            .map(|token| format!("'{}'", token.text))
            .unwrap_or_else(|| "end of input".to_string());
        tracing::debug!(expected, %found, "parse recovery");
        self.errors.push(ParseError {
            expected: expected.to_string(),
            found,
            span: self.here(),
        });
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> bool {
        if self.eat(kind) {
            true
        } else {
            self.error(expected);
            false
        }
    }

    // --- grammar ---

    fn section(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat_keyword(Keyword::Section);
        let mut children = Vec::new();
        if let Some(name) = self.identifier("section name") {
            children.push(name);
        }
        self.expect(TokenKind::Semicolon, "';'");
        while !self.done() {
            let before = self.pos;
            children.push(self.section_member());
            if self.pos == before {
                // recovery: a member that consumed nothing would loop forever
                self.bump();
            }
        }
        let node = self
            .tree
            .push(NodeKind::Section, Span::new(start, self.last_end()));
        self.tree.set_children(node, children);
        node
    }

    fn section_member(&mut self) -> NodeId {
        let start = self.here().start;
        let shared = self.eat_keyword(Keyword::Shared);
        let mut children = Vec::new();
        match self.identifier("member name") {
            Some(key) => children.push(key),
            None => {
                self.bump();
            }
        }
        self.expect(TokenKind::Equals, "'='");
        if let Some(value) = self.expression() {
            children.push(value);
        }
        self.expect(TokenKind::Semicolon, "';'");
        let node = self.tree.push(
            NodeKind::SectionMember { shared },
            Span::new(start, self.last_end()),
        );
        self.tree.set_children(node, children);
        node
    }

    fn expression(&mut self) -> Option<NodeId> {
        match self.peek().map(|token| token.kind) {
            Some(TokenKind::Keyword(Keyword::Let)) => Some(self.let_expression()),
            Some(TokenKind::Keyword(Keyword::Each)) => Some(self.each_expression()),
            Some(TokenKind::Keyword(Keyword::If)) => Some(self.if_expression()),
            Some(TokenKind::LeftParen) if self.function_ahead() => {
                Some(self.function_expression())
            }
            _ => self.binary(0),
        }
    }

    fn let_expression(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat_keyword(Keyword::Let);
        let mut children = Vec::new();
        loop {
            let binding_start = self.here().start;
            let mut binding_children = Vec::new();
            match self.identifier("binding name") {
                Some(key) => binding_children.push(key),
                None => break,
            }
            self.expect(TokenKind::Equals, "'='");
            if let Some(value) = self.expression() {
                binding_children.push(value);
            }
            let binding = self.tree.push(
                NodeKind::LetBinding,
                Span::new(binding_start, self.last_end()),
            );
            self.tree.set_children(binding, binding_children);
            children.push(binding);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        if self.expect(TokenKind::Keyword(Keyword::In), "'in'") {
            if let Some(body) = self.expression() {
                children.push(body);
            }
        }
        let node = self
            .tree
            .push(NodeKind::LetExpression, Span::new(start, self.last_end()));
        self.tree.set_children(node, children);
        node
    }

    fn each_expression(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat_keyword(Keyword::Each);
        let children = self.expression().into_iter().collect();
        let node = self
            .tree
            .push(NodeKind::EachExpression, Span::new(start, self.last_end()));
        self.tree.set_children(node, children);
        node
    }

    fn if_expression(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat_keyword(Keyword::If);
        let mut children = Vec::new();
        if let Some(condition) = self.expression() {
            children.push(condition);
        }
        self.expect(TokenKind::Keyword(Keyword::Then), "'then'");
        if let Some(then_branch) = self.expression() {
            children.push(then_branch);
        }
        self.expect(TokenKind::Keyword(Keyword::Else), "'else'");
        if let Some(else_branch) = self.expression() {
            children.push(else_branch);
        }
        let node = self
            .tree
            .push(NodeKind::IfExpression, Span::new(start, self.last_end()));
        self.tree.set_children(node, children);
        node
    }

    /// Distinguishes `(x, y) => ...` from a parenthesized expression by
    /// scanning for the matching `)` followed by `=>`
    fn function_ahead(&self) -> bool {
        let mut depth = 0usize;
        for (index, token) in self.tokens[self.pos..].iter().enumerate() {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(self.pos + index + 1)
                            .map(|next| next.kind == TokenKind::FatArrow)
                            .unwrap_or(false);
                    }
                }
                _ => {}
            }
        }
        false
    }

    fn function_expression(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat(TokenKind::LeftParen);
        let mut children = Vec::new();
        while !self.at(TokenKind::RightParen) && !self.done() {
            children.push(self.parameter());
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "')'");
        self.expect(TokenKind::FatArrow, "'=>'");
        if let Some(body) = self.expression() {
            children.push(body);
        }
        let node = self.tree.push(
            NodeKind::FunctionExpression,
            Span::new(start, self.last_end()),
        );
        self.tree.set_children(node, children);
        node
    }

    fn parameter(&mut self) -> NodeId {
        let start = self.here().start;
        let optional = self.eat_keyword(Keyword::Optional);
        let mut nullable = false;
        let mut children = Vec::new();
        match self.identifier("parameter name") {
            Some(name) => children.push(name),
            None => {
                self.bump();
            }
        }
        if self.eat_keyword(Keyword::As) {
            nullable = self.eat_keyword(Keyword::Nullable);
            match self.peek() {
                Some(token) if token.kind == TokenKind::Identifier => {
                    let span = token.span;
                    let name = token.text.clone();
                    self.bump();
                    children.push(self.tree.push(NodeKind::TypeName(name), span));
                }
                _ => self.error("type name"),
            }
        }
        let node = self.tree.push(
            NodeKind::Parameter { optional, nullable },
            Span::new(start, self.last_end()),
        );
        self.tree.set_children(node, children);
        node
    }

    fn binary(&mut self, min_precedence: u8) -> Option<NodeId> {
        let mut lhs = self.unary()?;
        while let Some((op, precedence)) = self.peek_binary_op() {
            if precedence < min_precedence {
                break;
            }
            self.bump();
            let rhs = self.binary(precedence + 1);
            let span = Span::new(self.tree.span(lhs).start, self.last_end());
            let node = self.tree.push(NodeKind::BinaryExpression(op), span);
            let mut children = vec![lhs];
            children.extend(rhs);
            self.tree.set_children(node, children);
            lhs = node;
        }
        Some(lhs)
    }

    fn peek_binary_op(&self) -> Option<(BinaryOp, u8)> {
        Some(match self.peek()?.kind {
            TokenKind::Keyword(Keyword::Or) => (BinaryOp::Or, 1),
            TokenKind::Keyword(Keyword::And) => (BinaryOp::And, 2),
            TokenKind::Less => (BinaryOp::Less, 3),
            TokenKind::LessEqual => (BinaryOp::LessEqual, 3),
            TokenKind::Greater => (BinaryOp::Greater, 3),
            TokenKind::GreaterEqual => (BinaryOp::GreaterEqual, 3),
            TokenKind::NotEqual => (BinaryOp::NotEqual, 3),
            TokenKind::Plus => (BinaryOp::Add, 4),
            TokenKind::Minus => (BinaryOp::Subtract, 4),
            TokenKind::Ampersand => (BinaryOp::Concat, 4),
            TokenKind::Star => (BinaryOp::Multiply, 5),
            TokenKind::Slash => (BinaryOp::Divide, 5),
            _ => return None,
        })
    }

    fn unary(&mut self) -> Option<NodeId> {
        let op = match self.peek()?.kind {
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.here().start;
            self.bump();
            let operand = self.unary();
            let node = self.tree.push(
                NodeKind::UnaryExpression(op),
                Span::new(start, self.last_end()),
            );
            self.tree.set_children(node, operand.into_iter().collect());
            return Some(node);
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Option<NodeId> {
        let mut node = self.primary()?;
        while self.at(TokenKind::LeftParen) {
            node = self.invocation(node);
        }
        Some(node)
    }

    fn invocation(&mut self, callee: NodeId) -> NodeId {
        let list_start = self.here().start;
        self.eat(TokenKind::LeftParen);
        let mut args = Vec::new();
        loop {
            if self.at(TokenKind::RightParen) || self.done() {
                break;
            }
            if self.can_start_expression() {
                if let Some(arg) = self.expression() {
                    args.push(arg);
                }
            }
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightParen, "')'");
        let list = self.tree.push(
            NodeKind::ArgumentList,
            Span::new(list_start, self.last_end()),
        );
        self.tree.set_children(list, args);
        let node = self.tree.push(
            NodeKind::Invocation,
            Span::new(self.tree.span(callee).start, self.last_end()),
        );
        self.tree.set_children(node, vec![callee, list]);
        node
    }

    fn can_start_expression(&self) -> bool {
        matches!(
            self.peek().map(|token| token.kind),
            Some(
                TokenKind::Number
                    | TokenKind::Text
                    | TokenKind::Identifier
                    | TokenKind::InclusiveIdentifier
                    | TokenKind::LeftParen
                    | TokenKind::LeftBracket
                    | TokenKind::Minus
                    | TokenKind::Keyword(
                        Keyword::Let
                            | Keyword::Each
                            | Keyword::If
                            | Keyword::True
                            | Keyword::False
                            | Keyword::Null
                            | Keyword::Not
                    )
            )
        )
    }

    fn primary(&mut self) -> Option<NodeId> {
        let token = match self.peek() {
            Some(token) => token,
            None => {
                self.error("expression");
                return None;
            }
        };
        let node = match token.kind {
            TokenKind::Number => {
                let span = token.span;
                self.bump();
                self.tree.push(NodeKind::NumberLiteral, span)
            }
            TokenKind::Text => {
                let span = token.span;
                self.bump();
                self.tree.push(NodeKind::TextLiteral, span)
            }
            TokenKind::Keyword(Keyword::True) => {
                let span = token.span;
                self.bump();
                self.tree.push(NodeKind::LogicalLiteral(true), span)
            }
            TokenKind::Keyword(Keyword::False) => {
                let span = token.span;
                self.bump();
                self.tree.push(NodeKind::LogicalLiteral(false), span)
            }
            TokenKind::Keyword(Keyword::Null) => {
                let span = token.span;
                self.bump();
                self.tree.push(NodeKind::NullLiteral, span)
            }
            TokenKind::Identifier => {
                let span = token.span;
                let name = token.text.clone();
                self.bump();
                self.tree.push(NodeKind::Identifier(name), span)
            }
            TokenKind::InclusiveIdentifier => {
                let span = token.span;
                let name = token.text.trim_start_matches('@').to_string();
                self.bump();
                self.tree.push(NodeKind::InclusiveIdentifier(name), span)
            }
            TokenKind::LeftBracket => self.record(),
            TokenKind::LeftParen => self.paren(),
            TokenKind::Keyword(Keyword::Let) => self.let_expression(),
            TokenKind::Keyword(Keyword::Each) => self.each_expression(),
            TokenKind::Keyword(Keyword::If) => self.if_expression(),
            _ => {
                self.error("expression");
                return None;
            }
        };
        Some(node)
    }

    fn record(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat(TokenKind::LeftBracket);
        let mut fields = Vec::new();
        while !self.at(TokenKind::RightBracket) && !self.done() {
            let field_start = self.here().start;
            let mut children = Vec::new();
            match self.identifier("field name") {
                Some(key) => children.push(key),
                None => {
                    self.bump();
                }
            }
            self.expect(TokenKind::Equals, "'='");
            if let Some(value) = self.expression() {
                children.push(value);
            }
            let field = self
                .tree
                .push(NodeKind::RecordField, Span::new(field_start, self.last_end()));
            self.tree.set_children(field, children);
            fields.push(field);
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.expect(TokenKind::RightBracket, "']'");
        let node = self
            .tree
            .push(NodeKind::RecordExpression, Span::new(start, self.last_end()));
        self.tree.set_children(node, fields);
        node
    }

    fn paren(&mut self) -> NodeId {
        let start = self.here().start;
        self.eat(TokenKind::LeftParen);
        let children = self.expression().into_iter().collect();
        self.expect(TokenKind::RightParen, "')'");
        let node = self
            .tree
            .push(NodeKind::ParenExpression, Span::new(start, self.last_end()));
        self.tree.set_children(node, children);
        node
    }

    fn identifier(&mut self, expected: &str) -> Option<NodeId> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Identifier => {
                let span = token.span;
                let name = token.text.clone();
                self.bump();
                Some(self.tree.push(NodeKind::Identifier(name), span))
            }
            _ => {
                self.error(expected);
                None
            }
        }
    }
}

use crate::ast::*;
use crate::lexer::{LexError, Lexer, Pos, Spanned, Token};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Lex error: {0}")]
    Lex(#[from] LexError),
    #[error("Unexpected {0} at {2}, expected {1}")]
    Unexpected(Token, &'static str, Pos),
    #[error("Unexpected end of input, expected {0}")]
    UnexpectedEof(&'static str),
    #[error("Number {0} out of range at {1}")]
    NumberOutOfRange(String, Pos),
    #[error("Nesting too deep at {0}")]
    TooDeep(Pos),
}

/// Deepest `[` nesting accepted in a type or value.
const MAX_DEPTH: usize = 64;

static EOF: Spanned = Spanned {
    token: Token::Eof,
    pos: Pos { line: 0, column: 0 },
};

/// Recursive-descent parser for GraphQL type system documents.
pub struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub fn new(input: &str) -> Result<Self, ParseError> {
        let tokens = Lexer::new(input).tokenize()?;
        Ok(Self {
            tokens,
            pos: 0,
            depth: 0,
        })
    }

    fn peek_spanned(&self) -> &Spanned {
        self.tokens.get(self.pos).unwrap_or(&EOF)
    }

    fn peek(&self) -> &Token {
        &self.peek_spanned().token
    }

    fn advance(&mut self) -> Spanned {
        let tok = self.peek_spanned().clone();
        self.pos += 1;
        tok
    }

    fn unexpected(tok: Spanned, expected: &'static str) -> ParseError {
        match tok.token {
            Token::Eof => ParseError::UnexpectedEof(expected),
            token => ParseError::Unexpected(token, expected, tok.pos),
        }
    }

    fn expect_name(&mut self) -> Result<String, ParseError> {
        let tok = self.advance();
        match tok.token {
            Token::Name(s) => Ok(s),
            _ => Err(Self::unexpected(tok, "name")),
        }
    }

    fn expect(&mut self, expected: Token, what: &'static str) -> Result<(), ParseError> {
        let tok = self.advance();
        if tok.token == expected {
            Ok(())
        } else {
            Err(Self::unexpected(tok, what))
        }
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == expected {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn enter(&mut self, pos: Pos) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::TooDeep(pos));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn check_name(&self, name: &str) -> bool {
        matches!(self.peek(), Token::Name(s) if s == name)
    }

    pub fn parse(&mut self) -> Result<Document, ParseError> {
        let mut definitions = Vec::new();

        while *self.peek() != Token::Eof {
            definitions.push(self.parse_definition()?);
        }

        Ok(Document { definitions })
    }

    fn parse_description(&mut self) -> Option<String> {
        if let Token::Str(s) = self.peek() {
            let s = s.clone();
            self.pos += 1;
            Some(s)
        } else {
            None
        }
    }

    fn parse_definition(&mut self) -> Result<Definition, ParseError> {
        if self.check_name("extend") {
            self.advance();
            let extended = self.parse_type_system_definition(None)?;
            return Ok(Definition::Extension(Box::new(extended)));
        }

        let description = self.parse_description();
        self.parse_type_system_definition(description)
    }

    fn parse_type_system_definition(
        &mut self,
        description: Option<String>,
    ) -> Result<Definition, ParseError> {
        const EXPECTED: &str = "type, interface, input, enum, union, scalar, schema, or directive";

        let keyword = match self.peek() {
            Token::Name(s) => Some(s.clone()),
            _ => None,
        };
        let Some(keyword) = keyword else {
            return Err(Self::unexpected(self.advance(), EXPECTED));
        };

        match keyword.as_str() {
            "type" => {
                self.advance();
                Ok(Definition::Object(self.parse_object(description)?))
            }
            "interface" => {
                self.advance();
                Ok(Definition::Interface(self.parse_object(description)?))
            }
            "input" => {
                self.advance();
                Ok(Definition::Input(self.parse_input(description)?))
            }
            "enum" => {
                self.advance();
                Ok(Definition::Enum(self.parse_enum(description)?))
            }
            "union" => {
                self.advance();
                Ok(Definition::Union(self.parse_union(description)?))
            }
            "scalar" => {
                self.advance();
                let name = self.expect_name()?;
                let directives = self.parse_directives()?;
                Ok(Definition::Scalar(NamedDefinition {
                    description,
                    name,
                    directives,
                }))
            }
            "schema" => {
                self.advance();
                Ok(Definition::Schema(self.parse_schema()?))
            }
            "directive" => {
                self.advance();
                Ok(Definition::DirectiveDef(
                    self.parse_directive_definition(description)?,
                ))
            }
            _ => Err(Self::unexpected(self.advance(), EXPECTED)),
        }
    }

    /// `Name implements A & B @dir { fields }`; shared by `type` and `interface`.
    fn parse_object(
        &mut self,
        description: Option<String>,
    ) -> Result<ObjectTypeDefinition, ParseError> {
        let name = self.expect_name()?;

        let mut interfaces = Vec::new();
        if self.check_name("implements") {
            self.advance();
            self.eat(&Token::Amp);
            interfaces.push(self.expect_name()?);
            while self.eat(&Token::Amp) {
                interfaces.push(self.expect_name()?);
            }
        }

        let directives = self.parse_directives()?;

        let mut fields = Vec::new();
        if self.eat(&Token::LBrace) {
            while !self.eat(&Token::RBrace) {
                fields.push(self.parse_field()?);
            }
        }

        Ok(ObjectTypeDefinition {
            description,
            name,
            interfaces,
            directives,
            fields,
        })
    }

    fn parse_field(&mut self) -> Result<FieldDefinition, ParseError> {
        let description = self.parse_description();
        let name = self.expect_name()?;

        let arguments = if *self.peek() == Token::LParen {
            self.parse_argument_definitions()?
        } else {
            Vec::new()
        };

        self.expect(Token::Colon, "\":\"")?;
        let ty = self.parse_type()?;
        let directives = self.parse_directives()?;

        Ok(FieldDefinition {
            description,
            name,
            arguments,
            ty,
            directives,
        })
    }

    fn parse_argument_definitions(&mut self) -> Result<Vec<InputValueDefinition>, ParseError> {
        self.expect(Token::LParen, "\"(\"")?;
        let mut args = Vec::new();
        while !self.eat(&Token::RParen) {
            args.push(self.parse_input_value()?);
        }
        Ok(args)
    }

    fn parse_input_value(&mut self) -> Result<InputValueDefinition, ParseError> {
        let description = self.parse_description();
        let name = self.expect_name()?;
        self.expect(Token::Colon, "\":\"")?;
        let ty = self.parse_type()?;

        let default_value = if self.eat(&Token::Eq) {
            Some(self.parse_value()?)
        } else {
            None
        };

        let directives = self.parse_directives()?;

        Ok(InputValueDefinition {
            description,
            name,
            ty,
            default_value,
            directives,
        })
    }

    fn parse_type(&mut self) -> Result<TypeRef, ParseError> {
        let tok = self.advance();
        let ty = match tok.token {
            Token::LBracket => {
                self.enter(tok.pos)?;
                let inner = self.parse_type()?;
                self.leave();
                self.expect(Token::RBracket, "\"]\"")?;
                TypeRef::List(Box::new(inner))
            }
            Token::Name(name) => TypeRef::Named(name),
            _ => return Err(Self::unexpected(tok, "type")),
        };

        if self.eat(&Token::Bang) {
            Ok(TypeRef::NonNull(Box::new(ty)))
        } else {
            Ok(ty)
        }
    }

    fn parse_directives(&mut self) -> Result<Vec<Directive>, ParseError> {
        let mut directives = Vec::new();
        while self.eat(&Token::At) {
            let name = self.expect_name()?;
            let arguments = if *self.peek() == Token::LParen {
                self.parse_arguments()?
            } else {
                Vec::new()
            };
            directives.push(Directive { name, arguments });
        }
        Ok(directives)
    }

    fn parse_arguments(&mut self) -> Result<Vec<(String, Value)>, ParseError> {
        self.expect(Token::LParen, "\"(\"")?;
        let mut args = Vec::new();
        while !self.eat(&Token::RParen) {
            let name = self.expect_name()?;
            self.expect(Token::Colon, "\":\"")?;
            args.push((name, self.parse_value()?));
        }
        Ok(args)
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        let tok = self.advance();
        match tok.token {
            Token::Dollar => Ok(Value::Variable(self.expect_name()?)),
            Token::Int(s) => s
                .parse()
                .map(Value::Int)
                .map_err(|_| ParseError::NumberOutOfRange(s, tok.pos)),
            Token::Float(s) => s
                .parse()
                .map(Value::Float)
                .map_err(|_| ParseError::NumberOutOfRange(s, tok.pos)),
            Token::Str(s) => Ok(Value::Str(s)),
            Token::Name(s) => Ok(match s.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                "null" => Value::Null,
                _ => Value::Enum(s),
            }),
            Token::LBracket => {
                self.enter(tok.pos)?;
                let mut items = Vec::new();
                while !self.eat(&Token::RBracket) {
                    items.push(self.parse_value()?);
                }
                self.leave();
                Ok(Value::List(items))
            }
            Token::LBrace => {
                self.enter(tok.pos)?;
                let mut entries = Vec::new();
                while !self.eat(&Token::RBrace) {
                    let name = self.expect_name()?;
                    self.expect(Token::Colon, "\":\"")?;
                    entries.push((name, self.parse_value()?));
                }
                self.leave();
                Ok(Value::Object(entries))
            }
            _ => Err(Self::unexpected(tok, "value")),
        }
    }

    fn parse_input(
        &mut self,
        description: Option<String>,
    ) -> Result<InputObjectDefinition, ParseError> {
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;

        let mut fields = Vec::new();
        if self.eat(&Token::LBrace) {
            while !self.eat(&Token::RBrace) {
                fields.push(self.parse_input_value()?);
            }
        }

        Ok(InputObjectDefinition {
            description,
            name,
            directives,
            fields,
        })
    }

    fn parse_enum(&mut self, description: Option<String>) -> Result<EnumDefinition, ParseError> {
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;

        let mut values = Vec::new();
        if self.eat(&Token::LBrace) {
            while !self.eat(&Token::RBrace) {
                self.parse_description();
                values.push(self.expect_name()?);
                self.parse_directives()?;
            }
        }

        Ok(EnumDefinition {
            description,
            name,
            directives,
            values,
        })
    }

    fn parse_union(&mut self, description: Option<String>) -> Result<UnionDefinition, ParseError> {
        let name = self.expect_name()?;
        let directives = self.parse_directives()?;

        let mut members = Vec::new();
        if self.eat(&Token::Eq) {
            self.eat(&Token::Pipe);
            members.push(self.expect_name()?);
            while self.eat(&Token::Pipe) {
                members.push(self.expect_name()?);
            }
        }

        Ok(UnionDefinition {
            description,
            name,
            directives,
            members,
        })
    }

    fn parse_schema(&mut self) -> Result<SchemaDefinition, ParseError> {
        let directives = self.parse_directives()?;

        let mut operations = Vec::new();
        if self.eat(&Token::LBrace) {
            while !self.eat(&Token::RBrace) {
                let operation = self.expect_name()?;
                self.expect(Token::Colon, "\":\"")?;
                operations.push((operation, self.expect_name()?));
            }
        }

        Ok(SchemaDefinition {
            directives,
            operations,
        })
    }

    fn parse_directive_definition(
        &mut self,
        description: Option<String>,
    ) -> Result<DirectiveDefinition, ParseError> {
        self.expect(Token::At, "\"@\"")?;
        let name = self.expect_name()?;

        let arguments = if *self.peek() == Token::LParen {
            self.parse_argument_definitions()?
        } else {
            Vec::new()
        };

        let repeatable = self.check_name("repeatable");
        if repeatable {
            self.advance();
        }

        if !self.check_name("on") {
            return Err(Self::unexpected(self.advance(), "\"on\""));
        }
        self.advance();

        self.eat(&Token::Pipe);
        let mut locations = vec![self.expect_name()?];
        while self.eat(&Token::Pipe) {
            locations.push(self.expect_name()?);
        }

        Ok(DirectiveDefinition {
            description,
            name,
            arguments,
            repeatable,
            locations,
        })
    }
}

/// Parses SDL text into a [`Document`].
pub fn parse(input: &str) -> Result<Document, ParseError> {
    Parser::new(input)?.parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object<'a>(doc: &'a Document, name: &str) -> &'a ObjectTypeDefinition {
        doc.object_types().find(|o| o.name == name).unwrap()
    }

    #[test]
    fn test_parse_model_type() {
        let input = r#"
            type Author @model {
                id: ID!
                name: String!
                books: [Book] @hasMany
            }
        "#;
        let doc = parse(input).unwrap();
        assert_eq!(doc.definitions.len(), 1);

        let author = object(&doc, "Author");
        assert!(author.has_directive("model"));
        assert_eq!(author.fields.len(), 3);
        assert_eq!(
            author.fields[0].ty,
            TypeRef::NonNull(Box::new(TypeRef::Named("ID".into())))
        );
        assert_eq!(
            author.fields[2].ty,
            TypeRef::List(Box::new(TypeRef::Named("Book".into())))
        );
        assert!(author.fields[2].directive("hasMany").is_some());
    }

    #[test]
    fn test_parse_single_line_with_commas() {
        let input = "type Book @model { id: ID!, title: String!, author: Author @belongsTo }";
        let doc = parse(input).unwrap();
        let book = object(&doc, "Book");
        assert_eq!(book.fields.len(), 3);
        assert_eq!(book.fields[2].name, "author");
    }

    #[test]
    fn test_parse_directive_arguments() {
        let input = r#"
            type Post @model @auth(rules: [{ allow: owner, operations: [create, read] }]) {
                id: ID!
                comments: [Comment] @hasMany(indexName: "byPost", fields: ["id"], limit: 10)
            }
        "#;
        let doc = parse(input).unwrap();
        let post = object(&doc, "Post");
        assert_eq!(post.directives.len(), 2);

        let auth = &post.directives[1];
        assert_eq!(auth.name, "auth");
        match &auth.arguments[0].1 {
            Value::List(rules) => assert!(matches!(rules[0], Value::Object(_))),
            other => panic!("unexpected value {:?}", other),
        }

        let has_many = post.fields[1].directive("hasMany").unwrap();
        assert_eq!(
            has_many.arguments[0],
            ("indexName".to_string(), Value::Str("byPost".into()))
        );
        assert_eq!(has_many.arguments[2], ("limit".to_string(), Value::Int(10)));
    }

    #[test]
    fn test_parse_descriptions_and_arguments() {
        let input = r#"
            """
            A blog post.
            """
            type Post @model {
                "Primary key"
                id: ID!
                tags(first: Int = 10, after: String): [String!]!
            }
        "#;
        let doc = parse(input).unwrap();
        let post = object(&doc, "Post");
        assert_eq!(post.description.as_deref(), Some("A blog post."));
        assert_eq!(post.fields[0].description.as_deref(), Some("Primary key"));
        assert_eq!(post.fields[1].arguments.len(), 2);
        assert_eq!(post.fields[1].arguments[0].default_value, Some(Value::Int(10)));
    }

    #[test]
    fn test_parse_type_without_fields() {
        let doc = parse("type ProductIndustry @model\ntype Empty @model {}").unwrap();
        assert_eq!(doc.definitions.len(), 2);
        assert!(object(&doc, "ProductIndustry").fields.is_empty());
        assert!(object(&doc, "Empty").fields.is_empty());
    }

    #[test]
    fn test_parse_other_definitions() {
        let input = r#"
            schema { query: Query mutation: Mutation }
            scalar AWSDateTime
            enum Status { DRAFT PUBLISHED @deprecated }
            union SearchResult = | Post | Comment
            input CreatePostInput { title: String!, status: Status = DRAFT }
            interface Node { id: ID! }
            type Post implements Node & Timestamped @model { id: ID! }
            directive @model(queries: ModelQueryMap) repeatable on OBJECT | FIELD_DEFINITION
            extend type Query { posts: [Post] }
        "#;
        let doc = parse(input).unwrap();
        assert_eq!(doc.definitions.len(), 9);

        assert!(matches!(&doc.definitions[2], Definition::Enum(e) if e.values == ["DRAFT", "PUBLISHED"]));
        assert!(matches!(&doc.definitions[3], Definition::Union(u) if u.members == ["Post", "Comment"]));
        assert!(matches!(&doc.definitions[7], Definition::DirectiveDef(d) if d.repeatable && d.locations.len() == 2));
        assert!(matches!(&doc.definitions[8], Definition::Extension(_)));

        let post = object(&doc, "Post");
        assert_eq!(post.interfaces, vec!["Node", "Timestamped"]);
        // extensions are not reported as object types
        assert_eq!(doc.object_types().count(), 1);
    }

    #[test]
    fn test_field_named_like_keyword() {
        let doc = parse("type Item @model { type: String, input: Int, enum: Boolean }").unwrap();
        let item = object(&doc, "Item");
        let names: Vec<_> = item.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["type", "input", "enum"]);
    }

    #[test]
    fn test_unterminated_type_block() {
        let err = parse("type Foo { ").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedEof(_)));
    }

    #[test]
    fn test_missing_field_type() {
        let err = parse("type Foo { id: }").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected \"}\" at 1:16, expected type");
    }

    #[test]
    fn test_executable_definitions_are_rejected() {
        assert!(parse("query { posts { id } }").is_err());
        assert!(parse("{ posts }").is_err());
    }

    #[test]
    fn test_nesting_limit() {
        let nested = |d: usize| format!("type A {{ f: {}Int{} }}", "[".repeat(d), "]".repeat(d));
        assert!(parse(&nested(MAX_DEPTH)).is_ok());
        assert!(matches!(
            parse(&nested(MAX_DEPTH + 1)),
            Err(ParseError::TooDeep(_))
        ));
        assert!(matches!(parse(&nested(50_000)), Err(ParseError::TooDeep(_))));

        let value = format!(
            "type A @auth(rules: {}1{}) {{ id: ID }}",
            "[".repeat(50_000),
            "]".repeat(50_000)
        );
        assert!(matches!(parse(&value), Err(ParseError::TooDeep(_))));

        let object = format!(
            "type A @auth(rules: {}1{}) {{ id: ID }}",
            "{a: ".repeat(100),
            "}".repeat(100)
        );
        let err = parse(&object).unwrap_err();
        assert_eq!(err.to_string(), format!("Nesting too deep at 1:{}", 21 + 4 * MAX_DEPTH));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse("").unwrap().definitions.is_empty());
        assert!(parse("   # only a comment\n").unwrap().definitions.is_empty());
    }
}

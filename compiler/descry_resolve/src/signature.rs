//! Foreign generic signature grammar.
//!
//! ```text
//! ClassSignature  := TypeParams? SuperclassRef InterfaceRef*
//! MethodSignature := TypeParams? '(' JavaType* ')' (JavaType | 'V') ('^' RefType)*
//! FieldSignature  := RefType
//! TypeParams      := '<' (Ident ':' RefType? (':' RefType)*)+ '>'
//! RefType         := 'L' Ident ('/' Ident)* TypeArgs? ('.' Ident TypeArgs?)* ';'
//!                  | 'T' Ident ';'
//!                  | '[' JavaType
//! TypeArgs        := '<' ('*' | '+' RefType | '-' RefType | RefType)+ '>'
//! JavaType        := 'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | RefType
//! ```
//!
//! `/` separates packages and `.` nested classes. Only the innermost class
//! keeps its type arguments; arguments of outer classes are dropped.

use descry_descriptors::PrimitiveType;
use descry_ir::{FqName, StringInterner};

use crate::raw::{RawType, RawTypeArgument, RawTypeParameter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureParseError {
    #[error("unexpected end of signature `{signature}`")]
    UnexpectedEnd { signature: String },

    #[error("unexpected `{found}` at {position} in signature `{signature}`")]
    Unexpected {
        found: char,
        position: usize,
        signature: String,
    },

    #[error("empty identifier at {position} in signature `{signature}`")]
    EmptyIdentifier { position: usize, signature: String },
}

/// A parsed class signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassSignature {
    pub type_parameters: Vec<RawTypeParameter>,
    pub superclass: RawType,
    pub interfaces: Vec<RawType>,
}

impl ClassSignature {
    /// Superclass followed by interfaces.
    pub fn supertypes(&self) -> impl Iterator<Item = &RawType> {
        std::iter::once(&self.superclass).chain(&self.interfaces)
    }
}

/// A parsed method signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodSignatureSyntax {
    pub type_parameters: Vec<RawTypeParameter>,
    pub parameters: Vec<RawType>,
    pub return_type: RawType,
    pub throws: Vec<RawType>,
}

pub fn parse_class_signature(
    interner: &StringInterner,
    signature: &str,
) -> Result<ClassSignature, SignatureParseError> {
    let mut parser = SignatureParser::new(interner, signature);
    let type_parameters = parser.type_parameters()?;
    let superclass = parser.reference_type()?;
    let mut interfaces = Vec::new();
    while !parser.at_end() {
        interfaces.push(parser.reference_type()?);
    }
    Ok(ClassSignature {
        type_parameters,
        superclass,
        interfaces,
    })
}

pub fn parse_method_signature(
    interner: &StringInterner,
    signature: &str,
) -> Result<MethodSignatureSyntax, SignatureParseError> {
    let mut parser = SignatureParser::new(interner, signature);
    let type_parameters = parser.type_parameters()?;
    parser.expect('(')?;
    let mut parameters = Vec::new();
    while parser.peek() != Some(')') {
        parameters.push(parser.java_type()?);
    }
    parser.expect(')')?;
    let return_type = if parser.eat('V') {
        RawType::Void
    } else {
        parser.java_type()?
    };
    let mut throws = Vec::new();
    while parser.eat('^') {
        throws.push(parser.reference_type()?);
    }
    parser.finish()?;
    Ok(MethodSignatureSyntax {
        type_parameters,
        parameters,
        return_type,
        throws,
    })
}

pub fn parse_field_signature(
    interner: &StringInterner,
    signature: &str,
) -> Result<RawType, SignatureParseError> {
    let mut parser = SignatureParser::new(interner, signature);
    let ty = parser.reference_type()?;
    parser.finish()?;
    Ok(ty)
}

struct SignatureParser<'a> {
    interner: &'a StringInterner,
    signature: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(interner: &'a StringInterner, signature: &'a str) -> Self {
        SignatureParser {
            interner,
            signature,
            chars: signature.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn bump(&mut self) -> Result<char, SignatureParseError> {
        let c = self.peek().ok_or_else(|| self.unexpected_end())?;
        self.pos += 1;
        Ok(c)
    }

    fn expect(&mut self, expected: char) -> Result<(), SignatureParseError> {
        let found = self.bump()?;
        if found == expected {
            Ok(())
        } else {
            Err(self.unexpected_at(found, self.pos - 1))
        }
    }

    fn finish(&self) -> Result<(), SignatureParseError> {
        match self.peek() {
            None => Ok(()),
            Some(c) => Err(self.unexpected_at(c, self.pos)),
        }
    }

    fn unexpected_end(&self) -> SignatureParseError {
        SignatureParseError::UnexpectedEnd {
            signature: self.signature.to_owned(),
        }
    }

    fn unexpected_at(&self, found: char, position: usize) -> SignatureParseError {
        SignatureParseError::Unexpected {
            found,
            position,
            signature: self.signature.to_owned(),
        }
    }

    fn identifier(&mut self) -> Result<&'a str, SignatureParseError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if matches!(c, '.' | ';' | '[' | '/' | '<' | '>' | ':') {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            return match self.peek() {
                None => Err(self.unexpected_end()),
                Some(_) => Err(SignatureParseError::EmptyIdentifier {
                    position: start,
                    signature: self.signature.to_owned(),
                }),
            };
        }
        Ok(self.slice(start, self.pos))
    }

    /// Sub-slice of the signature between two char positions.
    fn slice(&self, start: usize, end: usize) -> &'a str {
        let byte_start: usize = self.chars[..start].iter().map(|c| c.len_utf8()).sum();
        let byte_len: usize = self.chars[start..end].iter().map(|c| c.len_utf8()).sum();
        &self.signature[byte_start..byte_start + byte_len]
    }

    fn type_parameters(&mut self) -> Result<Vec<RawTypeParameter>, SignatureParseError> {
        let mut params = Vec::new();
        if !self.eat('<') {
            return Ok(params);
        }
        loop {
            let name = self.interner.intern(self.identifier()?);
            self.expect(':')?;
            let mut bounds = Vec::new();
            // The class bound may be empty (`T::Ljava/lang/Comparable;`).
            if !matches!(self.peek(), Some(':' | '>')) {
                bounds.push(self.reference_type()?);
            }
            while self.eat(':') {
                bounds.push(self.reference_type()?);
            }
            params.push(RawTypeParameter { name, bounds });
            if self.eat('>') {
                return Ok(params);
            }
        }
    }

    fn java_type(&mut self) -> Result<RawType, SignatureParseError> {
        let c = self.peek().ok_or_else(|| self.unexpected_end())?;
        if let Some(primitive) = PrimitiveType::from_descriptor(c) {
            self.pos += 1;
            return Ok(RawType::Primitive(primitive));
        }
        self.reference_type()
    }

    fn reference_type(&mut self) -> Result<RawType, SignatureParseError> {
        let start = self.pos;
        match self.bump()? {
            'L' => self.class_type(),
            'T' => {
                let name = self.interner.intern(self.identifier()?);
                self.expect(';')?;
                Ok(RawType::TypeVariable(name))
            }
            '[' => Ok(RawType::array(self.java_type()?)),
            other => Err(self.unexpected_at(other, start)),
        }
    }

    fn class_type(&mut self) -> Result<RawType, SignatureParseError> {
        let mut fq_name = FqName::root();
        loop {
            fq_name = fq_name.child(self.interner.intern(self.identifier()?));
            if !self.eat('/') {
                break;
            }
        }
        let mut arguments = self.type_arguments()?;
        while self.eat('.') {
            fq_name = fq_name.child(self.interner.intern(self.identifier()?));
            arguments = self.type_arguments()?;
        }
        self.expect(';')?;
        Ok(RawType::Class { fq_name, arguments })
    }

    fn type_arguments(&mut self) -> Result<Vec<RawTypeArgument>, SignatureParseError> {
        let mut arguments = Vec::new();
        if !self.eat('<') {
            return Ok(arguments);
        }
        while !self.eat('>') {
            let argument = match self.peek() {
                Some('*') => {
                    self.pos += 1;
                    RawTypeArgument::Wildcard
                }
                Some('+') => {
                    self.pos += 1;
                    RawTypeArgument::Extends(self.reference_type()?)
                }
                Some('-') => {
                    self.pos += 1;
                    RawTypeArgument::Super(self.reference_type()?)
                }
                Some(_) => RawTypeArgument::Type(self.reference_type()?),
                None => return Err(self.unexpected_end()),
            };
            arguments.push(argument);
        }
        Ok(arguments)
    }
}

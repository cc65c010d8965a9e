//! Human-readable rendering of types, for diagnostics and signature errors.

use std::fmt::Write;

use descry_ir::StringLookup;

use crate::arena::Descriptors;
use crate::types::{Type, TypeProjection, Variance};

impl Descriptors {
    /// Render `ty` as source-like text (`lang.List<out T>?`).
    pub fn render_type<L: StringLookup + ?Sized>(&self, ty: &Type, lookup: &L) -> String {
        let mut out = String::new();
        self.write_type(&mut out, ty, lookup);
        out
    }

    fn write_type<L: StringLookup + ?Sized>(&self, out: &mut String, ty: &Type, lookup: &L) {
        match ty {
            Type::Class {
                class,
                arguments,
                nullable,
            } => {
                let _ = write!(out, "{}", self.class(*class).fq_name.display(lookup));
                if !arguments.is_empty() {
                    out.push('<');
                    for (i, arg) in arguments.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_projection(out, arg, lookup);
                    }
                    out.push('>');
                }
                if *nullable {
                    out.push('?');
                }
            }
            Type::Parameter {
                parameter,
                nullable,
            } => {
                out.push_str(lookup.lookup(self.type_param(*parameter).name));
                if *nullable {
                    out.push('?');
                }
            }
            Type::Function {
                receiver,
                parameters,
                return_type,
            } => {
                if let Some(receiver) = receiver {
                    self.write_type(out, receiver, lookup);
                    out.push('.');
                }
                out.push('(');
                for (i, param) in parameters.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(out, param, lookup);
                }
                out.push_str(") -> ");
                self.write_type(out, return_type, lookup);
            }
            Type::Error { description } => {
                let _ = write!(out, "[ERROR: {description}]");
            }
        }
    }

    fn write_projection<L: StringLookup + ?Sized>(
        &self,
        out: &mut String,
        projection: &TypeProjection,
        lookup: &L,
    ) {
        match projection {
            TypeProjection::Star => out.push('*'),
            TypeProjection::Type { variance, ty } => {
                match variance {
                    Variance::Invariant => {}
                    Variance::In => out.push_str("in "),
                    Variance::Out => out.push_str("out "),
                }
                self.write_type(out, ty, lookup);
            }
        }
    }
}

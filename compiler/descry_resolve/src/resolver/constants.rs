//! Constant values of annotation arguments.

use descry_descriptors::ConstantValue;

use super::{annotations, class, Resolver, SearchRule};
use crate::raw::RawConstant;
use crate::ResolveError;

/// `None` when an enum class or nested annotation cannot be resolved.
pub(crate) fn resolve_constant(
    r: &mut Resolver<'_>,
    raw: &RawConstant,
) -> Result<Option<ConstantValue>, ResolveError> {
    let value = match raw {
        RawConstant::Boolean(v) => ConstantValue::Boolean(*v),
        RawConstant::Byte(v) => ConstantValue::Byte(*v),
        RawConstant::Short(v) => ConstantValue::Short(*v),
        RawConstant::Int(v) => ConstantValue::Int(*v),
        RawConstant::Long(v) => ConstantValue::Long(*v),
        RawConstant::Char(v) => ConstantValue::Char(*v),
        RawConstant::Float(v) => ConstantValue::float(*v),
        RawConstant::Double(v) => ConstantValue::double(*v),
        RawConstant::String(v) => ConstantValue::String(v.clone()),
        RawConstant::Enum { class, entry } => {
            match class::resolve_class(r, class, SearchRule::IncludeNative)? {
                Some(class) => ConstantValue::EnumEntry {
                    class,
                    entry: *entry,
                },
                None => return Ok(None),
            }
        }
        RawConstant::Array(items) => {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                let Some(value) = resolve_constant(r, item)? else {
                    return Ok(None);
                };
                values.push(value);
            }
            ConstantValue::Array(values)
        }
        RawConstant::Annotation(nested) => match annotations::resolve_annotation(r, nested)? {
            Some(id) => ConstantValue::Annotation(id),
            None => return Ok(None),
        },
    };
    Ok(Some(value))
}

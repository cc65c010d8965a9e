//! Whole-file analysis.
//!
//! Resolves every granule of a file and folds the results into one
//! context. This is the boundary where internal failures stop: anything
//! other than cancellation becomes a single diagnostic on the file.

use std::panic::{self, AssertUnwindSafe};

use descry_diagnostic::exception_while_analyzing;
use descry_resolve::ResolveError;

use crate::granule::granules;
use crate::session::LazyResolveSession;
use crate::syntax::{ElementId, FileId};
use crate::trace::BindingContext;

/// Resolve every granule of `file`.
///
/// Returns the facts of all granules over the session context. If
/// resolution fails or panics the returned context holds only an
/// internal-error diagnostic; a cancelled session returns
/// [`ResolveError::Cancelled`].
#[tracing::instrument(level = "debug", skip(session))]
pub fn analyze_file(
    session: &LazyResolveSession,
    file: FileId,
) -> Result<BindingContext, ResolveError> {
    let Some(tree) = session.tree(file) else {
        return Err(ResolveError::UnknownElement {
            element: format!("{file:?}"),
        });
    };

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let mut facts = BindingContext::new();
        for (node, granule) in granules(&tree) {
            session.cancellation().check()?;
            tracing::trace!(?granule, node = node.raw(), "analyzing granule");
            let resolved = session.resolve_to_element(ElementId::new(file, node))?;
            facts.merge(&resolved);
        }
        Ok::<_, ResolveError>(facts)
    }));

    let cause = match outcome {
        Ok(Ok(facts)) => {
            let mut context = BindingContext::with_parent(session.context());
            context.merge(&facts);
            return Ok(context);
        }
        Ok(Err(ResolveError::Cancelled)) => return Err(ResolveError::Cancelled),
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    tracing::error!(file = tree.file_name(), %cause, "analysis failed");
    let mut context = BindingContext::new();
    context.report(exception_while_analyzing(tree.file_name(), &cause));
    Ok(context)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic".to_string()
    }
}

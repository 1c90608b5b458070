use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::fmt;

use axum::routing::MethodFilter;

/// HTTP verbs a controller method can be declared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpVerb {
    /// Upper-case wire name (`"GET"`, `"POST"`, ...).
    pub fn as_str(self) -> &'static str {
        match self {
            HttpVerb::Get => "GET",
            HttpVerb::Post => "POST",
            HttpVerb::Put => "PUT",
            HttpVerb::Delete => "DELETE",
        }
    }

    pub(crate) fn method_filter(self) -> MethodFilter {
        match self {
            HttpVerb::Get => MethodFilter::GET,
            HttpVerb::Post => MethodFilter::POST,
            HttpVerb::Put => MethodFilter::PUT,
            HttpVerb::Delete => MethodFilter::DELETE,
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(verb, path suffix, method)` binding declared against a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub verb: HttpVerb,
    pub suffix: String,
    pub method: &'static str,
}

/// Everything declared for one controller type.
#[derive(Debug, Default)]
struct GroupMeta {
    type_name: &'static str,
    prefix: Option<String>,
    routes: Vec<RouteEntry>,
}

/// Declarative route metadata, keyed by controller type.
///
/// Controllers fill the registry from
/// [`Controller::declare`](crate::controller::Controller::declare) while the
/// application is assembled; the [binder](crate::binder) reads it back once,
/// before the router accepts traffic. Nothing is removed afterwards.
///
/// Malformed declarations are logged and dropped rather than failing startup.
#[derive(Default)]
pub struct RouteRegistry {
    inner: HashMap<TypeId, GroupMeta>,
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the path prefix shared by every route of `C`.
    ///
    /// A second call for the same type replaces the previous prefix.
    pub fn declare_group<C: 'static>(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if let Err(reason) = check_fragment(&prefix) {
            tracing::warn!(
                controller = type_name::<C>(),
                prefix = %prefix,
                reason,
                "Ignoring malformed controller prefix"
            );
            return;
        }
        self.entry::<C>().prefix = Some(prefix);
    }

    /// Append a route for `method` to the declarations of `C`.
    ///
    /// Declarations are kept in call order and never de-duplicated, so a
    /// method may answer several verb/path pairs.
    pub fn declare_route<C: 'static>(
        &mut self,
        method: &'static str,
        verb: HttpVerb,
        suffix: impl Into<String>,
    ) {
        let suffix = suffix.into();
        let checked = if method.trim().is_empty() {
            Err("method name is empty")
        } else {
            check_fragment(&suffix)
        };
        if let Err(reason) = checked {
            tracing::warn!(
                controller = type_name::<C>(),
                method,
                %verb,
                suffix = %suffix,
                reason,
                "Ignoring malformed route declaration"
            );
            return;
        }
        self.entry::<C>().routes.push(RouteEntry {
            verb,
            suffix,
            method,
        });
    }

    /// Prefix declared for `C`, if any.
    pub fn group<C: 'static>(&self) -> Option<&str> {
        self.group_of(TypeId::of::<C>())
    }

    /// Routes declared for `C`, in declaration order.
    pub fn routes<C: 'static>(&self) -> &[RouteEntry] {
        self.routes_of(TypeId::of::<C>())
    }

    pub fn group_of(&self, id: TypeId) -> Option<&str> {
        self.inner.get(&id).and_then(|meta| meta.prefix.as_deref())
    }

    pub fn routes_of(&self, id: TypeId) -> &[RouteEntry] {
        self.inner
            .get(&id)
            .map(|meta| meta.routes.as_slice())
            .unwrap_or(&[])
    }

    /// Type name recorded for a controller, used in diagnostics.
    pub fn type_name_of(&self, id: TypeId) -> Option<&'static str> {
        self.inner.get(&id).map(|meta| meta.type_name)
    }

    fn entry<C: 'static>(&mut self) -> &mut GroupMeta {
        self.inner
            .entry(TypeId::of::<C>())
            .or_insert_with(|| GroupMeta {
                type_name: type_name::<C>(),
                ..GroupMeta::default()
            })
    }
}

/// Prefixes and suffixes are either empty or an absolute path fragment.
fn check_fragment(fragment: &str) -> Result<(), &'static str> {
    if fragment.is_empty() {
        return Ok(());
    }
    if !fragment.starts_with('/') {
        return Err("path fragment must start with '/'");
    }
    if fragment.chars().any(char::is_whitespace) {
        return Err("path fragment contains whitespace");
    }
    Ok(())
}

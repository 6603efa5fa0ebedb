use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::iter::zip;
use std::rc::{Rc, Weak};

use crate::ast::{InternalError, SExpr, Var};
use crate::capabilities::CapabilityRegistry;
use crate::{EResult, EvalError};

/// State shared by every scope descended from the same root:
/// for now, just the capability registry.
///
/// Only the root's lineage owns the registry. Closures and dispatching
/// functions hold a weak handle, since the registry in turn holds closures.
#[derive(Clone)]
pub struct Session {
    registry: Weak<CapabilityRegistry<Var>>,
    owner: Option<Rc<CapabilityRegistry<Var>>>,
}

impl Default for Session {
    fn default() -> Self {
        let owner = Rc::new(CapabilityRegistry::new());
        Session {
            registry: Rc::downgrade(&owner),
            owner: Some(owner),
        }
    }
}

impl Session {
    pub fn registry(
        &self,
    ) -> Result<Rc<CapabilityRegistry<Var>>, InternalError> {
        match &self.owner {
            Some(owner) => Ok(owner.clone()),
            None => self
                .registry
                .upgrade()
                .ok_or(InternalError::SessionEnded),
        }
    }

    /// A handle to the same registry that does not keep it alive
    pub fn downgrade(&self) -> Session {
        Session {
            registry: self.registry.clone(),
            owner: None,
        }
    }
}

impl PartialEq for Session {
    fn eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.registry, &other.registry)
    }
}

impl Debug for Session {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Session@{:p}", self.registry.as_ptr())
    }
}

#[derive(Clone)]
pub struct Scope(Rc<InnerScope>);

/// The actual scope data
struct InnerScope {
    parent: Option<Scope>,
    session: Session,
    symbols: RefCell<HashMap<String, Var>>,
}

impl Scope {
    /// A child of `parent`, or a root with a brand-new session
    pub fn new(parent: Option<Scope>) -> Self {
        let session = parent
            .as_ref()
            .map(|p| p.session().clone())
            .unwrap_or_default();
        Scope(Rc::new(InnerScope {
            parent,
            session,
            symbols: RefCell::new(HashMap::new()),
        }))
    }

    /// A new root scope that still shares this scope's session, without
    /// owning it. Closures capture into one of these.
    pub fn detached(&self) -> Self {
        Scope(Rc::new(InnerScope {
            parent: None,
            session: self.session().downgrade(),
            symbols: RefCell::new(HashMap::new()),
        }))
    }

    pub fn child(&self) -> Self {
        let parent = Scope(self.0.clone());

        Scope::new(Some(parent))
    }

    pub fn session(&self) -> &Session {
        &self.0.session
    }

    pub fn set(&mut self, key: &str, val: Var) {
        self.0
            .symbols
            .borrow_mut()
            .insert(key.to_string(), val);
    }

    pub fn has(&self, symbol: &str) -> bool {
        self.0
            .symbols
            .borrow()
            .contains_key(symbol)
    }

    pub fn lookup(&self, symbol: &str) -> Option<Var> {
        self.0
            .symbols
            .borrow()
            .get(symbol)
            .cloned()
            .or_else(|| {
                self.0
                    .parent
                    .as_ref()
                    .and_then(|parent| parent.lookup(symbol))
            })
    }

    /***********\
    |* Helpers *|
    \***********/
    pub fn lookup_or_error(&self, symbol: &str) -> EResult<Var> {
        self.lookup(symbol)
            .ok_or_else(|| EvalError::LookupError(symbol.to_string()))
    }

    /// Helper: Create a new scope with these arguments bound to it
    pub fn bind_args(&self, names: &[String], values: &SExpr) -> Self {
        let mut child_scope = self.child();
        zip(names.iter(), values.iter()).for_each(|(name, param)| {
            child_scope.set(name, param.clone());
        });
        child_scope
    }
}

// Closures can hold the very scope they were captured into, so only the
// bound names are shown.
impl Debug for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let symbols = self.0.symbols.borrow();
        let mut names: Vec<&String> = symbols.keys().collect();
        names.sort();
        f.debug_struct("Scope")
            .field("symbols", &names)
            .field("parent", &self.0.parent)
            .finish()
    }
}

impl PartialEq for Scope {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Value;

    #[test]
    fn test_lookup_walks_parents() {
        let mut root = Scope::new(None);
        root.set("x", Value::Int(1).into());
        let mut child = root.child();
        child.set("y", Value::Int(2).into());

        assert_eq!(child.lookup("x"), Some(Var::from(Value::Int(1))));
        assert_eq!(root.lookup("y"), None);
        assert!(!child.has("x"));
    }

    #[test]
    fn test_sessions_are_shared_by_descendants() {
        let root = Scope::new(None);
        assert_eq!(root.child().session(), root.session());
        assert_eq!(root.detached().session(), root.session());
        assert_ne!(Scope::new(None).session(), root.session());
    }

    #[test]
    fn test_detached_scopes_do_not_keep_the_registry() {
        let root = Scope::new(None);
        let captured = root.detached();
        assert!(captured.session().registry().is_ok());

        drop(root);
        assert!(matches!(
            captured.session().registry(),
            Err(InternalError::SessionEnded)
        ));
    }
}

//! Capabilities: named sets of operations, and an open registry that binds
//! implementations of them to types.
//!
//! The registry is deliberately decoupled from type definitions: anyone can
//! register an implementation for any type at any time, including built-in
//! types, and the last registration for a `(type, capability)` pair wins.
//! Resolution is by exact runtime type; there is no fallback to any other
//! type.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast::{CResult, CapabilityError, TypeInfo, TypeKind, TypeRef, TypeTag};

/// Operation name -> implementation
pub type ImplMap<I> = IndexMap<String, I>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationSig {
    pub name: String,
    /// number of arguments, including the receiver
    pub arity: usize,
}

impl OperationSig {
    pub fn new(name: impl Into<String>, arity: usize) -> Self {
        OperationSig {
            name: name.into(),
            arity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability {
    pub name: String,
    pub operations: Vec<OperationSig>,
}

impl Capability {
    pub fn new(name: impl Into<String>, operations: Vec<OperationSig>) -> Self {
        Capability {
            name: name.into(),
            operations,
        }
    }

    pub fn operation(&self, name: &str) -> Option<&OperationSig> {
        self.operations
            .iter()
            .find(|op| op.name == name)
    }

    /// every key of `operations` must name one of our operations
    fn check_operations<I>(&self, operations: &ImplMap<I>) -> CResult<()> {
        match operations
            .keys()
            .find(|op| self.operation(op).is_none())
        {
            Some(op) => {
                Err(CapabilityError::UnknownOperation {
                    capability: self.name.clone(),
                    operation: op.clone(),
                })
            },
            None => Ok(()),
        }
    }
}

/// Plain key-overwrite merge: for each key, the last map that has it wins.
pub fn merge_impls<'a, I: Clone + 'a>(
    maps: impl IntoIterator<Item = &'a ImplMap<I>>,
) -> ImplMap<I> {
    let mut merged = ImplMap::new();
    for map in maps {
        for (name, implementation) in map {
            merged.insert(name.clone(), implementation.clone());
        }
    }
    merged
}

/// Anything that can be the first argument of a capability operation.
pub trait Receiver<I> {
    fn runtime_type(&self) -> TypeRef;

    /// Receivers built by `create_anonymous` carry their own operations
    fn as_anonymous(&self) -> Option<&Anonymous<I>> {
        None
    }
}

/*******************\
|* The registry    *|
\*******************/
#[derive(Debug)]
struct Binding<I> {
    type_name: String,
    operations: ImplMap<I>,
}

#[derive(Debug)]
struct RegistryState<I> {
    capabilities: HashMap<String, Arc<Capability>>,
    bindings: HashMap<(TypeTag, String), Binding<I>>,
}

/// Maps `(type, capability)` to a set of operation implementations.
///
/// Writers (`declare`, `register*`) are serialized behind the write lock and
/// readers share the read lock. Resolution clones the implementation out, so
/// no lock is held while an implementation runs.
#[derive(Debug)]
pub struct CapabilityRegistry<I> {
    state: RwLock<RegistryState<I>>,
}

impl<I> Default for CapabilityRegistry<I> {
    fn default() -> Self {
        CapabilityRegistry {
            state: RwLock::new(RegistryState {
                capabilities: HashMap::new(),
                bindings: HashMap::new(),
            }),
        }
    }
}

impl<I: Clone> CapabilityRegistry<I> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a capability. Declaring the exact same signatures again is a
    /// no-op; declaring different ones under a known name is an error.
    pub fn declare(&self, capability: Capability) -> CResult<Arc<Capability>> {
        let mut state = self.state.write();
        if let Some(existing) = state.capabilities.get(&capability.name) {
            return if **existing == capability {
                Ok(existing.clone())
            } else {
                Err(CapabilityError::Duplicate {
                    name: capability.name,
                })
            };
        }

        tracing::debug!(
            capability = %capability.name,
            operations = capability.operations.len(),
            "declared capability"
        );
        let capability = Arc::new(capability);
        state
            .capabilities
            .insert(capability.name.clone(), capability.clone());
        Ok(capability)
    }

    pub fn capability(&self, name: &str) -> CResult<Arc<Capability>> {
        self.state
            .read()
            .capabilities
            .get(name)
            .cloned()
            .ok_or_else(|| CapabilityError::UnknownCapability(name.to_string()))
    }

    /// Bind `operations` to `(ty, capability)`, replacing whatever was bound
    /// there before. Operations missing from the new map are gone.
    pub fn register(
        &self,
        ty: &TypeInfo,
        capability: &str,
        operations: ImplMap<I>,
    ) -> CResult<()> {
        self.register_batch(ty, vec![(capability.to_string(), operations)])
    }

    /// Register several capabilities against one type at once.
    /// Either every entry is valid and all are bound, or nothing changes.
    pub fn register_batch(
        &self,
        ty: &TypeInfo,
        entries: Vec<(String, ImplMap<I>)>,
    ) -> CResult<()> {
        let mut state = self.state.write();
        for (name, operations) in &entries {
            state
                .capabilities
                .get(name)
                .ok_or_else(|| CapabilityError::UnknownCapability(name.clone()))?
                .check_operations(operations)?;
        }

        for (name, operations) in entries {
            tracing::debug!(
                capability = %name,
                type_name = %ty.name,
                operations = operations.len(),
                "registered implementation"
            );
            state.bindings.insert(
                (ty.tag, name),
                Binding {
                    type_name: ty.name.clone(),
                    operations,
                },
            );
        }
        Ok(())
    }

    /// Drop every implementation bound to `tag`. Used when a type name is
    /// redefined, so the old type no longer shows up as an implementor.
    pub fn retire(&self, tag: TypeTag) -> usize {
        let mut state = self.state.write();
        let before = state.bindings.len();
        state
            .bindings
            .retain(|(bound, _), _| *bound != tag);
        let retired = before - state.bindings.len();
        if retired > 0 {
            tracing::debug!(?tag, retired, "retired implementations");
        }
        retired
    }

    /// Find the implementation of `capability/operation` for exactly `ty`
    pub fn resolve(
        &self,
        capability: &str,
        operation: &str,
        ty: &TypeInfo,
    ) -> CResult<I> {
        let state = self.state.read();
        let declared = state
            .capabilities
            .get(capability)
            .ok_or_else(|| CapabilityError::UnknownCapability(capability.to_string()))?;
        if declared.operation(operation).is_none() {
            return Err(CapabilityError::UnknownOperation {
                capability: capability.to_string(),
                operation: operation.to_string(),
            });
        }

        state
            .bindings
            .get(&(ty.tag, capability.to_string()))
            .and_then(|binding| binding.operations.get(operation))
            .cloned()
            .ok_or_else(|| {
                CapabilityError::NoImplementation {
                    capability: capability.to_string(),
                    operation: operation.to_string(),
                    type_name: ty.name.clone(),
                }
            })
    }

    /// Resolve against the receiver's runtime type. Anonymous receivers
    /// answer for their own capability first.
    pub fn dispatch<R: Receiver<I>>(
        &self,
        capability: &str,
        operation: &str,
        receiver: &R,
    ) -> CResult<I> {
        match receiver.as_anonymous() {
            Some(anonymous) if anonymous.capability.name == capability => {
                anonymous.resolve(capability, operation)
            },
            _ => self.resolve(capability, operation, &receiver.runtime_type()),
        }
    }

    /// Has `capability` been registered for exactly this type?
    pub fn implements(&self, capability: &str, tag: TypeTag) -> bool {
        self.state
            .read()
            .bindings
            .contains_key(&(tag, capability.to_string()))
    }

    pub fn satisfies<R: Receiver<I>>(&self, capability: &str, receiver: &R) -> bool {
        match receiver.as_anonymous() {
            Some(anonymous) if anonymous.capability.name == capability => true,
            _ => self.implements(capability, receiver.runtime_type().tag),
        }
    }

    /// Names of every type with an implementation of `capability`, sorted
    pub fn implementors(&self, capability: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .read()
            .bindings
            .iter()
            .filter(|((_, name), _)| name == capability)
            .map(|(_, binding)| binding.type_name.clone())
            .collect();
        names.sort();
        names
    }

    /// Build a single-use implementation of a declared capability, with a
    /// type of its own that nothing else shares.
    pub fn create_anonymous(
        &self,
        capability: &str,
        operations: ImplMap<I>,
    ) -> CResult<Anonymous<I>> {
        let capability = self.capability(capability)?;
        Anonymous::new(capability, operations)
    }
}

/*************************\
|* Anonymous instances  *|
\*************************/
#[derive(Debug, Clone)]
pub struct Anonymous<I> {
    info: TypeRef,
    capability: Arc<Capability>,
    operations: ImplMap<I>,
}

impl<I: Clone> Anonymous<I> {
    fn new(capability: Arc<Capability>, operations: ImplMap<I>) -> CResult<Self> {
        capability.check_operations(&operations)?;
        let info = TypeInfo::declare(
            format!("reify<{}>", capability.name),
            TypeKind::Anonymous,
            Vec::new(),
        );
        Ok(Anonymous {
            info,
            capability,
            operations,
        })
    }

    pub fn resolve(&self, capability: &str, operation: &str) -> CResult<I> {
        if capability == self.capability.name && self.capability.operation(operation).is_none() {
            return Err(CapabilityError::UnknownOperation {
                capability: capability.to_string(),
                operation: operation.to_string(),
            });
        }

        self.operations
            .get(operation)
            .filter(|_| capability == self.capability.name)
            .cloned()
            .ok_or_else(|| {
                CapabilityError::NoImplementation {
                    capability: capability.to_string(),
                    operation: operation.to_string(),
                    type_name: self.info.name.clone(),
                }
            })
    }
}

impl<I> Anonymous<I> {
    pub fn type_info(&self) -> &TypeRef {
        &self.info
    }

    pub fn capability(&self) -> &Capability {
        &self.capability
    }
}

impl<I> PartialEq for Anonymous<I> {
    fn eq(&self, other: &Self) -> bool {
        self.info == other.info
    }
}

// xtce-core
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The validated, cross-referenced, immutable schema a loader builds and the codec engine reads.
//!
//! A [`SchemaBuilder`] accumulates parameter types, parameters, containers and the like as a
//! loader walks its source document, assigning each a qualified name. [`SchemaBuilder::finish`]
//! resolves every reference by name, detects inheritance cycles and duplicate names, precomputes
//! each container's and meta-command's full (root-to-leaf) entry list, and returns the immutable
//! [`SpaceSystem`] the public decode/encode API operates on.

use std::collections::HashMap;

use lasso::{Rodeo, RodeoReader, Spur};

use crate::comparison::ComparisonList;
use crate::error::{duplicate_name, Error, Result, SchemaError};
use crate::types::{ArgumentType, ParameterType};

pub type NameId = Spur;

macro_rules! index_type {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            fn new(idx: usize) -> Self {
                $name(idx as u32)
            }

            fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

index_type!(ParamTypeId);
index_type!(ArgTypeId);
index_type!(ParamId);
index_type!(ArgId);
index_type!(ContainerId);
index_type!(MetaCommandId);

/// How a `locationInContainerInBits` offset is anchored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReferenceLocation {
    ContainerStart,
    PreviousEntry,
}

/// An explicit bit-position override on a `ParameterRefEntry`.
#[derive(Clone, Copy, Debug)]
pub struct Location {
    pub reference: ReferenceLocation,
    pub offset_bits: i64,
}

/// One element of a container's or meta-command's entry list.
#[derive(Clone, Debug)]
pub enum Entry {
    ParameterRef { param: ParamId, location: Option<Location> },
    ArgumentRef { arg: ArgId },
    ContainerRef { container: ContainerId, include_condition: Option<ComparisonList> },
    FixedValue { size_in_bits: u32, value: Vec<u8> },
}

/// A telemetry parameter declaration.
#[derive(Clone, Debug)]
pub struct Parameter {
    pub name: String,
    pub param_type: ParamTypeId,
}

/// A command argument declaration.
#[derive(Clone, Debug)]
pub struct Argument {
    pub name: String,
    pub arg_type: ArgTypeId,
}

/// A telemetry container: an ordered entry list, optionally inheriting from a base container
/// under a restriction.
#[derive(Clone, Debug)]
pub struct Container {
    pub name: String,
    pub base: Option<ContainerId>,
    pub restriction: Option<ComparisonList>,
    pub own_entries: Vec<Entry>,
    /// Base-to-leaf concatenation of every ancestor's `own_entries` followed by this
    /// container's own, computed once at build time.
    pub inherited_entries: Vec<Entry>,
    /// Containers whose `base` is this container, in declaration order — the candidates
    /// considered when resolving which subtype a packet belongs to.
    pub children: Vec<ContainerId>,
}

/// A command definition: an ordered argument/fixed-value entry list, optionally inheriting from
/// a base meta-command.
#[derive(Clone, Debug)]
pub struct MetaCommand {
    pub name: String,
    pub base: Option<MetaCommandId>,
    pub own_entries: Vec<Entry>,
    pub inherited_entries: Vec<Entry>,
}

/// A namespace node in the declared `SpaceSystem` tree, kept for structural introspection; the
/// codec engine itself only ever looks things up by fully qualified name in the flat tables
/// below.
#[derive(Clone, Debug, Default)]
pub struct SpaceSystemNode {
    pub name: String,
    pub children: Vec<SpaceSystemNode>,
}

/// The immutable, validated, fully cross-referenced schema produced by [`SchemaBuilder::finish`].
pub struct SpaceSystem {
    root: SpaceSystemNode,
    interner: RodeoReader,

    parameter_types: Vec<ParameterType>,
    argument_types: Vec<ArgumentType>,
    parameters: Vec<Parameter>,
    arguments: Vec<Argument>,
    containers: Vec<Container>,
    meta_commands: Vec<MetaCommand>,

    param_type_by_name: HashMap<NameId, ParamTypeId>,
    arg_type_by_name: HashMap<NameId, ArgTypeId>,
    param_by_name: HashMap<NameId, ParamId>,
    arg_by_name: HashMap<NameId, ArgId>,
    container_by_name: HashMap<NameId, ContainerId>,
    meta_command_by_name: HashMap<NameId, MetaCommandId>,
}

impl SpaceSystem {
    pub fn root(&self) -> &SpaceSystemNode {
        &self.root
    }

    pub fn parameter_type(&self, id: ParamTypeId) -> Option<&ParameterType> {
        self.parameter_types.get(id.index())
    }

    pub fn argument_type(&self, id: ArgTypeId) -> Option<&ArgumentType> {
        self.argument_types.get(id.index())
    }

    pub fn parameter(&self, id: ParamId) -> Option<&Parameter> {
        self.parameters.get(id.index())
    }

    pub fn argument(&self, id: ArgId) -> Option<&Argument> {
        self.arguments.get(id.index())
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(id.index())
    }

    pub fn meta_command(&self, id: MetaCommandId) -> Option<&MetaCommand> {
        self.meta_commands.get(id.index())
    }

    pub fn container_id_by_name(&self, name: &str) -> Option<ContainerId> {
        let key = self.interner.get(name)?;
        self.container_by_name.get(&key).copied()
    }

    pub fn meta_command_id_by_name(&self, name: &str) -> Option<MetaCommandId> {
        let key = self.interner.get(name)?;
        self.meta_command_by_name.get(&key).copied()
    }

    pub fn parameter_id_by_name(&self, name: &str) -> Option<ParamId> {
        let key = self.interner.get(name)?;
        self.param_by_name.get(&key).copied()
    }

    pub fn argument_id_by_name(&self, name: &str) -> Option<ArgId> {
        let key = self.interner.get(name)?;
        self.arg_by_name.get(&key).copied()
    }

    pub fn container_by_name(&self, name: &str) -> Option<&Container> {
        self.container_id_by_name(name).and_then(|id| self.container(id))
    }

    pub fn meta_command_by_name(&self, name: &str) -> Option<&MetaCommand> {
        self.meta_command_id_by_name(name).and_then(|id| self.meta_command(id))
    }
}

/// Accumulates schema entities with their fully qualified names during loading; loaders never
/// construct a [`SpaceSystem`] directly.
#[derive(Default)]
pub struct SchemaBuilder {
    root: SpaceSystemNode,
    interner: Rodeo,

    parameter_types: Vec<ParameterType>,
    argument_types: Vec<ArgumentType>,
    parameters: Vec<Parameter>,
    arguments: Vec<Argument>,
    containers: Vec<Container>,
    meta_commands: Vec<MetaCommand>,

    param_type_names: HashMap<NameId, ParamTypeId>,
    arg_type_names: HashMap<NameId, ArgTypeId>,
    param_names: HashMap<NameId, ParamId>,
    arg_names: HashMap<NameId, ArgId>,
    container_names: HashMap<NameId, ContainerId>,
    meta_command_names: HashMap<NameId, MetaCommandId>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_root_name(&mut self, name: impl Into<String>) {
        self.root.name = name.into();
    }

    /// Ensures a path of nested `SpaceSystem` names exists below the root in the structural
    /// tree, creating intermediate nodes as needed. A loader calls this once per `SpaceSystem`
    /// element it visits; the codec engine never walks this tree itself, it only ever resolves
    /// entities by fully qualified name through the flat tables below, so a loader that skips
    /// this call loses nothing but introspection.
    pub fn register_space_system_path(&mut self, path: &[&str]) {
        let mut node = &mut self.root;
        for name in path {
            let idx = match node.children.iter().position(|c| c.name == *name) {
                Some(idx) => idx,
                None => {
                    node.children.push(SpaceSystemNode { name: name.to_string(), children: Vec::new() });
                    node.children.len() - 1
                }
            };
            node = &mut node.children[idx];
        }
    }

    fn check_unique(&mut self, kind: &'static str, name: &str) -> Result<NameId> {
        let key = self.interner.get_or_intern(name);
        let already_used = self.param_type_names.contains_key(&key)
            || self.arg_type_names.contains_key(&key)
            || self.param_names.contains_key(&key)
            || self.arg_names.contains_key(&key)
            || self.container_names.contains_key(&key)
            || self.meta_command_names.contains_key(&key);
        if already_used {
            return duplicate_name(kind, name);
        }
        Ok(key)
    }

    pub fn add_parameter_type(&mut self, name: &str, ty: ParameterType) -> Result<ParamTypeId> {
        let key = self.check_unique("parameter type", name)?;
        let id = ParamTypeId::new(self.parameter_types.len());
        self.parameter_types.push(ty);
        self.param_type_names.insert(key, id);
        Ok(id)
    }

    pub fn add_argument_type(&mut self, name: &str, ty: ArgumentType) -> Result<ArgTypeId> {
        let key = self.check_unique("argument type", name)?;
        let id = ArgTypeId::new(self.argument_types.len());
        self.argument_types.push(ty);
        self.arg_type_names.insert(key, id);
        Ok(id)
    }

    pub fn add_parameter(&mut self, name: &str, param_type: ParamTypeId) -> Result<ParamId> {
        let key = self.check_unique("parameter", name)?;
        let id = ParamId::new(self.parameters.len());
        self.parameters.push(Parameter { name: name.to_string(), param_type });
        self.param_names.insert(key, id);
        Ok(id)
    }

    pub fn add_argument(&mut self, name: &str, arg_type: ArgTypeId) -> Result<ArgId> {
        let key = self.check_unique("argument", name)?;
        let id = ArgId::new(self.arguments.len());
        self.arguments.push(Argument { name: name.to_string(), arg_type });
        self.arg_names.insert(key, id);
        Ok(id)
    }

    pub fn add_container(
        &mut self,
        name: &str,
        base: Option<ContainerId>,
        restriction: Option<ComparisonList>,
        own_entries: Vec<Entry>,
    ) -> Result<ContainerId> {
        let key = self.check_unique("container", name)?;
        let id = ContainerId::new(self.containers.len());
        self.containers.push(Container {
            name: name.to_string(),
            base,
            restriction,
            own_entries,
            inherited_entries: Vec::new(),
            children: Vec::new(),
        });
        self.container_names.insert(key, id);
        Ok(id)
    }

    pub fn add_meta_command(
        &mut self,
        name: &str,
        base: Option<MetaCommandId>,
        own_entries: Vec<Entry>,
    ) -> Result<MetaCommandId> {
        let key = self.check_unique("meta-command", name)?;
        let id = MetaCommandId::new(self.meta_commands.len());
        self.meta_commands.push(MetaCommand {
            name: name.to_string(),
            base,
            own_entries,
            inherited_entries: Vec::new(),
        });
        self.meta_command_names.insert(key, id);
        Ok(id)
    }

    pub fn interner(&self) -> &Rodeo {
        &self.interner
    }

    /// Validates every cross-reference, detects inheritance cycles, precomputes each
    /// container's and meta-command's full inherited entry list and child index, and freezes
    /// the builder into an immutable [`SpaceSystem`].
    pub fn finish(mut self) -> Result<SpaceSystem> {
        self.validate_references()?;
        self.compute_container_ancestry()?;
        self.compute_meta_command_ancestry()?;
        self.compute_children()?;

        Ok(SpaceSystem {
            root: self.root,
            interner: self.interner.into_reader(),
            parameter_types: self.parameter_types,
            argument_types: self.argument_types,
            parameters: self.parameters,
            arguments: self.arguments,
            containers: self.containers,
            meta_commands: self.meta_commands,
            param_type_by_name: self.param_type_names,
            arg_type_by_name: self.arg_type_names,
            param_by_name: self.param_names,
            arg_by_name: self.arg_names,
            container_by_name: self.container_names,
            meta_command_by_name: self.meta_command_names,
        })
    }

    fn validate_references(&self) -> Result<()> {
        for p in &self.parameters {
            if self.parameter_types.get(p.param_type.index()).is_none() {
                return Err(Error::Schema(SchemaError::DanglingReference {
                    from: p.name.clone(),
                    reference: "parameter type".to_string(),
                }));
            }
        }
        for a in &self.arguments {
            if self.argument_types.get(a.arg_type.index()).is_none() {
                return Err(Error::Schema(SchemaError::DanglingReference {
                    from: a.name.clone(),
                    reference: "argument type".to_string(),
                }));
            }
        }
        for c in &self.containers {
            if let Some(base) = c.base {
                if self.containers.get(base.index()).is_none() {
                    return Err(Error::Schema(SchemaError::DanglingReference {
                        from: c.name.clone(),
                        reference: "base container".to_string(),
                    }));
                }
            }
            for entry in &c.own_entries {
                self.validate_entry(&c.name, entry)?;
            }
        }
        for mc in &self.meta_commands {
            if let Some(base) = mc.base {
                if self.meta_commands.get(base.index()).is_none() {
                    return Err(Error::Schema(SchemaError::DanglingReference {
                        from: mc.name.clone(),
                        reference: "base meta-command".to_string(),
                    }));
                }
            }
            for entry in &mc.own_entries {
                self.validate_entry(&mc.name, entry)?;
            }
        }
        Ok(())
    }

    fn validate_entry(&self, owner: &str, entry: &Entry) -> Result<()> {
        match entry {
            Entry::ParameterRef { param, .. } => {
                if self.parameters.get(param.index()).is_none() {
                    return Err(Error::Schema(SchemaError::DanglingReference {
                        from: owner.to_string(),
                        reference: "parameter".to_string(),
                    }));
                }
            }
            Entry::ArgumentRef { arg } => {
                if self.arguments.get(arg.index()).is_none() {
                    return Err(Error::Schema(SchemaError::DanglingReference {
                        from: owner.to_string(),
                        reference: "argument".to_string(),
                    }));
                }
            }
            Entry::ContainerRef { container, .. } => {
                if self.containers.get(container.index()).is_none() {
                    return Err(Error::Schema(SchemaError::DanglingReference {
                        from: owner.to_string(),
                        reference: "container".to_string(),
                    }));
                }
            }
            Entry::FixedValue { .. } => {}
        }
        Ok(())
    }

    fn compute_container_ancestry(&mut self) -> Result<()> {
        let mut resolved: Vec<Option<Vec<Entry>>> = vec![None; self.containers.len()];

        for i in 0..self.containers.len() {
            self.resolve_container_chain(i, &mut resolved, &mut Vec::new())?;
        }

        for (i, entries) in resolved.into_iter().enumerate() {
            self.containers[i].inherited_entries =
                entries.expect("every container index is resolved by the loop above");
        }
        Ok(())
    }

    fn resolve_container_chain(
        &self,
        idx: usize,
        resolved: &mut Vec<Option<Vec<Entry>>>,
        visiting: &mut Vec<usize>,
    ) -> Result<Vec<Entry>> {
        if let Some(entries) = &resolved[idx] {
            return Ok(entries.clone());
        }
        if visiting.contains(&idx) {
            return Err(Error::Schema(SchemaError::CyclicInheritance {
                container: self.containers[idx].name.clone(),
            }));
        }
        visiting.push(idx);

        let mut entries = match self.containers[idx].base {
            Some(base) => self.resolve_container_chain(base.index(), resolved, visiting)?,
            None => Vec::new(),
        };
        entries.extend(self.containers[idx].own_entries.iter().cloned());

        visiting.pop();
        resolved[idx] = Some(entries.clone());
        Ok(entries)
    }

    fn compute_meta_command_ancestry(&mut self) -> Result<()> {
        let mut resolved: Vec<Option<Vec<Entry>>> = vec![None; self.meta_commands.len()];

        for i in 0..self.meta_commands.len() {
            self.resolve_meta_command_chain(i, &mut resolved, &mut Vec::new())?;
        }

        for (i, entries) in resolved.into_iter().enumerate() {
            self.meta_commands[i].inherited_entries =
                entries.expect("every meta-command index is resolved by the loop above");
        }
        Ok(())
    }

    fn resolve_meta_command_chain(
        &self,
        idx: usize,
        resolved: &mut Vec<Option<Vec<Entry>>>,
        visiting: &mut Vec<usize>,
    ) -> Result<Vec<Entry>> {
        if let Some(entries) = &resolved[idx] {
            return Ok(entries.clone());
        }
        if visiting.contains(&idx) {
            return Err(Error::Schema(SchemaError::CyclicInheritance {
                container: self.meta_commands[idx].name.clone(),
            }));
        }
        visiting.push(idx);

        let mut entries = match self.meta_commands[idx].base {
            Some(base) => self.resolve_meta_command_chain(base.index(), resolved, visiting)?,
            None => Vec::new(),
        };
        entries.extend(self.meta_commands[idx].own_entries.iter().cloned());

        visiting.pop();
        resolved[idx] = Some(entries.clone());
        Ok(entries)
    }

    fn compute_children(&mut self) -> Result<()> {
        for i in 0..self.containers.len() {
            if let Some(base) = self.containers[i].base {
                let child_id = ContainerId::new(i);
                self.containers[base.index()].children.push(child_id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_across_kinds_is_rejected() {
        let mut b = SchemaBuilder::new();
        let ty = b
            .add_parameter_type(
                "u8",
                ParameterType::Integer(crate::types::BaseType {
                    name: String::new(),
                    units: Vec::new(),
                    valid_range: None,
                    encoding: crate::encoding::DataEncoding::Integer {
                        size_in_bits: 8,
                        signed: crate::encoding::IntegerSigned::Unsigned,
                    },
                    calibrator: None,
                }),
            )
            .unwrap();
        b.add_parameter("x", ty).unwrap();
        // A container cannot steal the name "x" already used by the parameter above.
        assert!(b.add_container("x", None, None, Vec::new()).is_err());
    }

    #[test]
    fn cyclic_base_container_is_rejected() {
        // `add_container` takes its base by the already-returned id of a prior container, so a
        // true cycle can only be introduced by mutating the chain after the fact.
        let mut b = SchemaBuilder::new();
        b.add_container("Self", None, None, Vec::new()).unwrap();
        b.containers[0].base = Some(ContainerId(0));
        assert!(b.finish().is_err());
    }

    #[test]
    fn dangling_container_reference_is_rejected() {
        let mut b = SchemaBuilder::new();
        let bogus = ContainerId(42);
        b.add_container("Root", Some(bogus), None, Vec::new()).unwrap();
        assert!(b.finish().is_err());
    }

    #[test]
    fn register_space_system_path_builds_nested_tree() {
        let mut b = SchemaBuilder::new();
        b.set_root_name("Root");
        b.register_space_system_path(&["Spacecraft", "Bus"]);
        b.register_space_system_path(&["Spacecraft", "Payload"]);
        let schema = b.finish().unwrap();
        assert_eq!(schema.root().name, "Root");
        assert_eq!(schema.root().children.len(), 1);
        assert_eq!(schema.root().children[0].name, "Spacecraft");
        assert_eq!(schema.root().children[0].children.len(), 2);
    }
}

// xtce-xml
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Turns a parsed [`document`] tree into a [`SpaceSystem`] via [`SchemaBuilder`].
//!
//! `SchemaBuilder::add_parameter`/`add_container`/... take already-resolved ids for whatever they
//! reference, so everything here has to be registered in dependency order: a parameter type before
//! any parameter that uses it, a base container before any container that inherits from it, and so
//! on. [`topo_sort`] does the ordering; the two passes below (`build_types_and_values`, then
//! `build_containers_and_commands`) walk the sorted order and drive the builder.

use std::collections::{HashMap, VecDeque};

use log::warn;

use xtce_core::calibration::{Calibrator, PolynomialCalibrator};
use xtce_core::comparison::{CompareOp, Comparison, ComparisonList};
use xtce_core::encoding::{BinarySizing, CharSet, DataEncoding, IntegerSigned, SizeIsOf, StringSizing};
use xtce_core::error::{dangling_reference, unsupported_construct};
use xtce_core::schema::{ContainerId, Entry, Location, ReferenceLocation, SchemaBuilder};
use xtce_core::types::{ArgumentType, ArraySize, BaseType, Epoch, EnumLabel, ParameterType, ValidRange};
use xtce_core::SpaceSystem;

use crate::document::*;
use crate::error::XmlError;

pub fn build_space_system(root: SpaceSystemXml) -> Result<SpaceSystem, XmlError> {
    let mut builder = SchemaBuilder::new();
    builder.set_root_name(root.name.clone());

    let mut nodes = Vec::new();
    flatten(&root, vec![root.name.clone()], &mut nodes);
    for (path, _) in nodes.iter().skip(1) {
        builder.register_space_system_path(&path[1..].iter().map(String::as_str).collect::<Vec<_>>());
    }
    for (path, node) in &nodes {
        if node.algorithm_set.is_some() {
            warn!("SpaceSystem '{}' declares an AlgorithmSet; algorithms are not executed by this loader", qualify(path, ""));
        }
        if node.stream_set.is_some() {
            warn!("SpaceSystem '{}' declares a StreamSet; streams have no runtime behavior here", qualify(path, ""));
        }
        if node.message_set.is_some() {
            warn!("SpaceSystem '{}' declares a MessageSet; messages are not modeled by this loader", qualify(path, ""));
        }
        if node.service_set.is_some() {
            warn!("SpaceSystem '{}' declares a ServiceSet; services are not modeled by this loader", qualify(path, ""));
        }
        if node.aliases.is_some() {
            warn!("SpaceSystem '{}' declares Aliases; aliases are dropped by this loader", qualify(path, ""));
        }
    }

    let mut ctx = Registry::collect(&nodes);
    ctx.process_types_and_values(&mut builder)?;
    ctx.process_containers_and_commands(&mut builder)?;

    Ok(builder.finish()?)
}

fn flatten<'a>(node: &'a SpaceSystemXml, path: Vec<String>, out: &mut Vec<(Vec<String>, &'a SpaceSystemXml)>) {
    out.push((path.clone(), node));
    for child in &node.children {
        let mut child_path = path.clone();
        child_path.push(child.name.clone());
        flatten(child, child_path, out);
    }
}

fn qualify(path: &[String], name: &str) -> String {
    let mut s = String::new();
    for seg in path {
        s.push('/');
        s.push_str(seg);
    }
    if !name.is_empty() {
        s.push('/');
        s.push_str(name);
    }
    s
}

/// Resolves `raw_ref` against `registry`, trying (in order): a fully qualified reference (leading
/// `/`), the same namespace as `current_path`, then a fallback search by bare local name. Returns
/// `None` for both "not found" and "ambiguous bare name" — callers report both as a dangling
/// reference, since from the loader's perspective neither resolves to one entity.
fn resolve_ref<T: Copy>(registry: &HashMap<String, T>, current_path: &[String], raw_ref: &str) -> Option<(String, T)> {
    if let Some(rest) = raw_ref.strip_prefix('/') {
        let key = format!("/{rest}");
        return registry.get(&key).map(|v| (key, *v));
    }
    let candidate = qualify(current_path, raw_ref);
    if let Some(v) = registry.get(&candidate) {
        return Some((candidate, *v));
    }
    let mut matches = registry.iter().filter(|(k, _)| k.rsplit('/').next() == Some(raw_ref));
    let (k, v) = matches.next()?;
    if matches.next().is_some() {
        return None;
    }
    Some((k.clone(), *v))
}

fn topo_sort(nodes: &[String], deps: &HashMap<String, Vec<String>>) -> Option<Vec<String>> {
    let mut in_degree: HashMap<String, usize> = nodes.iter().map(|n| (n.clone(), 0)).collect();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    for node in nodes {
        for dep in deps.get(node).into_iter().flatten() {
            *in_degree.get_mut(node).unwrap() += 1;
            dependents.entry(dep.clone()).or_default().push(node.clone());
        }
    }
    let mut queue: VecDeque<String> =
        nodes.iter().filter(|n| in_degree[*n] == 0).cloned().collect();
    let mut order = Vec::with_capacity(nodes.len());
    while let Some(n) = queue.pop_front() {
        order.push(n.clone());
        for d in dependents.get(&n).into_iter().flatten() {
            let e = in_degree.get_mut(d).unwrap();
            *e -= 1;
            if *e == 0 {
                queue.push_back(d.clone());
            }
        }
    }
    if order.len() == nodes.len() {
        Some(order)
    }
    else {
        None
    }
}

// --- node keys -----------------------------------------------------------------------------
//
// The type/value dependency graph mixes four different kinds of entity in one topological sort
// (a parameter depends on its type, a dynamically sized type depends on its size parameter); a
// short kind tag keeps their qualified names from colliding in one flat key space.

fn pt_key(q: &str) -> String {
    format!("pt:{q}")
}
fn at_key(q: &str) -> String {
    format!("at:{q}")
}
fn p_key(q: &str) -> String {
    format!("p:{q}")
}
fn a_key(q: &str) -> String {
    format!("a:{q}")
}

struct Registry<'a> {
    param_types: HashMap<String, &'a ParameterTypeKindXml>,
    param_type_paths: HashMap<String, Vec<String>>,
    arg_types: HashMap<String, &'a ArgumentTypeKindXml>,
    arg_type_paths: HashMap<String, Vec<String>>,
    params: HashMap<String, &'a ParameterXml>,
    param_paths: HashMap<String, Vec<String>>,
    args: HashMap<String, (&'a ArgumentXml, Vec<String>)>,
    containers: HashMap<String, &'a SequenceContainerXml>,
    container_paths: HashMap<String, Vec<String>>,
    meta_commands: HashMap<String, &'a MetaCommandXml>,
    meta_command_paths: HashMap<String, Vec<String>>,

    param_type_ids: HashMap<String, xtce_core::schema::ParamTypeId>,
    arg_type_ids: HashMap<String, xtce_core::schema::ArgTypeId>,
    param_ids: HashMap<String, xtce_core::schema::ParamId>,
    arg_ids: HashMap<String, xtce_core::schema::ArgId>,
    container_ids: HashMap<String, ContainerId>,
    meta_command_ids: HashMap<String, xtce_core::schema::MetaCommandId>,
}

impl<'a> Registry<'a> {
    fn collect(nodes: &[(Vec<String>, &'a SpaceSystemXml)]) -> Self {
        let mut reg = Registry {
            param_types: HashMap::new(),
            param_type_paths: HashMap::new(),
            arg_types: HashMap::new(),
            arg_type_paths: HashMap::new(),
            params: HashMap::new(),
            param_paths: HashMap::new(),
            args: HashMap::new(),
            containers: HashMap::new(),
            container_paths: HashMap::new(),
            meta_commands: HashMap::new(),
            meta_command_paths: HashMap::new(),
            param_type_ids: HashMap::new(),
            arg_type_ids: HashMap::new(),
            param_ids: HashMap::new(),
            arg_ids: HashMap::new(),
            container_ids: HashMap::new(),
            meta_command_ids: HashMap::new(),
        };

        for (path, node) in nodes {
            if let Some(tm) = &node.telemetry_meta_data {
                if let Some(set) = &tm.parameter_type_set {
                    for ty in &set.types {
                        if let Some(name) = param_type_name(ty) {
                            let q = qualify(path, name);
                            reg.param_types.insert(q.clone(), ty);
                            reg.param_type_paths.insert(q, path.clone());
                        }
                        else {
                            warn!("dropping unsupported parameter type construct in '{}'", qualify(path, ""));
                        }
                    }
                }
                if let Some(set) = &tm.parameter_set {
                    for p in &set.parameter {
                        let q = qualify(path, &p.name);
                        reg.params.insert(q.clone(), p);
                        reg.param_paths.insert(q, path.clone());
                    }
                }
                if let Some(set) = &tm.container_set {
                    for c in &set.sequence_container {
                        let q = qualify(path, &c.name);
                        reg.containers.insert(q.clone(), c);
                        reg.container_paths.insert(q, path.clone());
                    }
                }
            }
            if let Some(cm) = &node.command_meta_data {
                if let Some(set) = &cm.argument_type_set {
                    for ty in &set.types {
                        if let Some(name) = arg_type_name(ty) {
                            let q = qualify(path, name);
                            reg.arg_types.insert(q.clone(), ty);
                            reg.arg_type_paths.insert(q, path.clone());
                        }
                        else {
                            warn!("dropping unsupported argument type construct in '{}'", qualify(path, ""));
                        }
                    }
                }
                if let Some(set) = &cm.meta_command_set {
                    for mc in &set.meta_command {
                        let q = qualify(path, &mc.name);
                        if let Some(al) = &mc.argument_list {
                            for arg in &al.argument {
                                let aq = qualify(&[q.clone()], &arg.name);
                                reg.args.insert(aq, (arg, path.clone()));
                            }
                        }
                        reg.meta_commands.insert(q.clone(), mc);
                        reg.meta_command_paths.insert(q, path.clone());
                    }
                }
            }
        }

        reg
    }

    fn process_types_and_values(&mut self, builder: &mut SchemaBuilder) -> Result<(), XmlError> {
        let mut node_keys = Vec::new();
        let mut deps: HashMap<String, Vec<String>> = HashMap::new();

        for q in self.param_types.keys() {
            node_keys.push(pt_key(q));
        }
        for q in self.arg_types.keys() {
            node_keys.push(at_key(q));
        }
        for q in self.params.keys() {
            node_keys.push(p_key(q));
        }
        for q in self.args.keys() {
            node_keys.push(a_key(q));
        }

        for (q, ty) in &self.param_types {
            let path = &self.param_type_paths[q];
            deps.insert(pt_key(q), self.param_type_deps(path, ty));
        }
        for (q, ty) in &self.arg_types {
            let path = &self.arg_type_paths[q];
            deps.insert(at_key(q), self.arg_type_deps(path, ty));
        }
        for (q, p) in &self.params {
            let path = &self.param_paths[q];
            let mut d = Vec::new();
            if let Some((key, _)) = resolve_ref(&unit_registry(&self.param_types), path, &p.parameter_type_ref) {
                d.push(pt_key(&key));
            }
            deps.insert(p_key(q), d);
        }
        for (q, (arg, path)) in &self.args {
            let mut d = Vec::new();
            if let Some((key, _)) = resolve_ref(&unit_registry(&self.arg_types), path, &arg.argument_type_ref) {
                d.push(at_key(&key));
            }
            deps.insert(a_key(q), d);
        }

        let order = topo_sort(&node_keys, &deps).ok_or_else(|| {
            XmlError::Schema(xtce_core::Error::Schema(xtce_core::error::SchemaError::CyclicInheritance {
                container: "parameter/argument type or size-parameter reference cycle".to_string(),
            }))
        })?;

        for key in order {
            if let Some(q) = key.strip_prefix("pt:") {
                let path = self.param_type_paths[q].clone();
                let ty = self.param_types[q];
                let built = self.build_parameter_type(&path, ty)?;
                if let Some(built) = built {
                    let id = builder.add_parameter_type(q, built)?;
                    self.param_type_ids.insert(q.to_string(), id);
                }
            }
            else if let Some(q) = key.strip_prefix("at:") {
                let path = self.arg_type_paths[q].clone();
                let ty = self.arg_types[q];
                let built = self.build_argument_type(&path, ty)?;
                if let Some(built) = built {
                    let id = builder.add_argument_type(q, built)?;
                    self.arg_type_ids.insert(q.to_string(), id);
                }
            }
            else if let Some(q) = key.strip_prefix("p:") {
                let path = self.param_paths[q].clone();
                let p = self.params[q];
                let Some((_, type_id)) = resolve_ref(&self.param_type_ids, &path, &p.parameter_type_ref) else {
                    return Err(dangling_reference::<()>(q.to_string(), p.parameter_type_ref.clone()).unwrap_err().into());
                };
                let id = builder.add_parameter(q, type_id)?;
                self.param_ids.insert(q.to_string(), id);
            }
            else if let Some(q) = key.strip_prefix("a:") {
                let (arg, path) = &self.args[q];
                let Some((_, type_id)) = resolve_ref(&self.arg_type_ids, path, &arg.argument_type_ref) else {
                    return Err(dangling_reference::<()>(q.to_string(), arg.argument_type_ref.clone()).unwrap_err().into());
                };
                let id = builder.add_argument(q, type_id)?;
                self.arg_ids.insert(q.to_string(), id);
            }
        }

        Ok(())
    }

    fn param_type_deps(&self, path: &[String], ty: &ParameterTypeKindXml) -> Vec<String> {
        match ty {
            ParameterTypeKindXml::StringParameterType(s) => self.string_encoding_deps(path, &s.encoding),
            ParameterTypeKindXml::BinaryParameterType(b) => self.binary_encoding_deps(path, &b.encoding),
            ParameterTypeKindXml::ArrayParameterType(a) => {
                let mut d = Vec::new();
                if let Some((key, _)) = resolve_ref(&unit_registry(&self.param_types), path, &a.array_type_ref) {
                    d.push(pt_key(&key));
                }
                d.extend(self.dimension_deps(path, &a.dimension_list));
                d
            }
            _ => Vec::new(),
        }
    }

    fn arg_type_deps(&self, path: &[String], ty: &ArgumentTypeKindXml) -> Vec<String> {
        match ty {
            ArgumentTypeKindXml::StringArgumentType(s) => self.string_encoding_deps(path, &s.encoding),
            ArgumentTypeKindXml::BinaryArgumentType(b) => self.binary_encoding_deps(path, &b.encoding),
            ArgumentTypeKindXml::ArrayArgumentType(a) => {
                let mut d = Vec::new();
                if let Some((key, _)) = resolve_ref(&unit_registry(&self.arg_types), path, &a.array_type_ref) {
                    d.push(at_key(&key));
                }
                d.extend(self.dimension_deps(path, &a.dimension_list));
                d
            }
            _ => Vec::new(),
        }
    }

    fn string_encoding_deps(&self, path: &[String], enc: &StringEncodingXml) -> Vec<String> {
        let mut d = Vec::new();
        if let Some(sib) = &enc.size_in_bits {
            if let Some(var) = &sib.variable {
                let raw = &var.dynamic_value.parameter_instance_ref.parameter_ref;
                if let Some((key, _)) = resolve_ref(&unit_registry(&self.params), path, raw) {
                    d.push(p_key(&key));
                }
            }
        }
        d
    }

    fn binary_encoding_deps(&self, path: &[String], enc: &BinaryEncodingXml) -> Vec<String> {
        let mut d = Vec::new();
        if let Some(dyn_val) = &enc.size_in_bits.dynamic_value {
            let raw = &dyn_val.parameter_instance_ref.parameter_ref;
            if let Some((key, _)) = resolve_ref(&unit_registry(&self.params), path, raw) {
                d.push(p_key(&key));
            }
        }
        d
    }

    fn dimension_deps(&self, path: &[String], dims: &Option<DimensionListXml>) -> Vec<String> {
        let mut d = Vec::new();
        let Some(dims) = dims else { return d };
        for dim in &dims.dimension {
            if let Some(end) = &dim.ending_index {
                if let Some(dyn_val) = &end.dynamic_value {
                    let raw = &dyn_val.parameter_instance_ref.parameter_ref;
                    if let Some((key, _)) = resolve_ref(&unit_registry(&self.params), path, raw) {
                        d.push(p_key(&key));
                    }
                }
            }
        }
        d
    }

    fn build_parameter_type(&self, path: &[String], ty: &ParameterTypeKindXml) -> Result<Option<ParameterType>, XmlError> {
        Ok(Some(match ty {
            ParameterTypeKindXml::IntegerParameterType(x) => {
                ParameterType::Integer(self.build_integer_base(path, x)?)
            }
            ParameterTypeKindXml::FloatParameterType(x) => ParameterType::Float(self.build_float_base(path, x)?),
            ParameterTypeKindXml::EnumeratedParameterType(x) => {
                let (base, labels) = self.build_enumerated(path, x)?;
                ParameterType::Enumerated { base, labels }
            }
            ParameterTypeKindXml::BooleanParameterType(x) => {
                let base = self.build_boolean_base(path, x)?;
                ParameterType::Boolean {
                    base,
                    zero_string: x.zero_string_value.clone(),
                    one_string: x.one_string_value.clone(),
                }
            }
            ParameterTypeKindXml::StringParameterType(x) => {
                ParameterType::String(self.build_string_base(path, x)?)
            }
            ParameterTypeKindXml::BinaryParameterType(x) => {
                ParameterType::Binary(self.build_binary_base(path, x)?)
            }
            ParameterTypeKindXml::AbsoluteTimeParameterType(x) => {
                let (base, epoch) = self.build_absolute_time(path, x)?;
                ParameterType::AbsoluteTime { base, epoch }
            }
            ParameterTypeKindXml::ArrayParameterType(x) => {
                let Some((_, element_type)) = resolve_ref(&self.param_type_ids, path, &x.array_type_ref) else {
                    return Err(dangling_reference::<()>(x.name.clone(), x.array_type_ref.clone()).unwrap_err().into());
                };
                ParameterType::Array { element_type, dimensions: self.build_dimensions(path, &x.dimension_list)? }
            }
            ParameterTypeKindXml::AggregateParameterType(_) | ParameterTypeKindXml::RelativeTimeParameterType(_) => {
                return Ok(None);
            }
        }))
    }

    fn build_argument_type(&self, path: &[String], ty: &ArgumentTypeKindXml) -> Result<Option<ArgumentType>, XmlError> {
        Ok(Some(match ty {
            ArgumentTypeKindXml::IntegerArgumentType(x) => ArgumentType::Integer(self.build_integer_base(path, x)?),
            ArgumentTypeKindXml::FloatArgumentType(x) => ArgumentType::Float(self.build_float_base(path, x)?),
            ArgumentTypeKindXml::EnumeratedArgumentType(x) => {
                let (base, labels) = self.build_enumerated(path, x)?;
                ArgumentType::Enumerated { base, labels }
            }
            ArgumentTypeKindXml::BooleanArgumentType(x) => {
                let base = self.build_boolean_base(path, x)?;
                ArgumentType::Boolean {
                    base,
                    zero_string: x.zero_string_value.clone(),
                    one_string: x.one_string_value.clone(),
                }
            }
            ArgumentTypeKindXml::StringArgumentType(x) => ArgumentType::String(self.build_string_base(path, x)?),
            ArgumentTypeKindXml::BinaryArgumentType(x) => ArgumentType::Binary(self.build_binary_base(path, x)?),
            ArgumentTypeKindXml::AbsoluteTimeArgumentType(x) => {
                let (base, epoch) = self.build_absolute_time(path, x)?;
                ArgumentType::AbsoluteTime { base, epoch }
            }
            ArgumentTypeKindXml::ArrayArgumentType(x) => {
                let Some((_, element_type)) = resolve_ref(&self.arg_type_ids, path, &x.array_type_ref) else {
                    return Err(dangling_reference::<()>(x.name.clone(), x.array_type_ref.clone()).unwrap_err().into());
                };
                ArgumentType::Array { element_type, dimensions: self.build_dimensions(path, &x.dimension_list)? }
            }
            ArgumentTypeKindXml::AggregateArgumentType(_) | ArgumentTypeKindXml::RelativeTimeArgumentType(_) => {
                return Ok(None);
            }
        }))
    }

    fn build_integer_base(&self, _path: &[String], x: &IntegerTypeXml) -> Result<BaseType, XmlError> {
        let (encoding, calibrator) = convert_integer_encoding(&x.encoding, &x.name)?;
        Ok(BaseType {
            name: x.name.clone(),
            units: convert_unit_set(&x.unit_set),
            valid_range: pick_valid_range(&x.valid_range, &x.valid_range_set, x.valid_range_applies_to_calibrated),
            encoding,
            calibrator,
        })
    }

    fn build_float_base(&self, _path: &[String], x: &FloatTypeXml) -> Result<BaseType, XmlError> {
        let (encoding, calibrator) = convert_float_type_encoding(x)?;
        Ok(BaseType {
            name: x.name.clone(),
            units: convert_unit_set(&x.unit_set),
            valid_range: pick_valid_range(&x.valid_range, &x.valid_range_set, x.valid_range_applies_to_calibrated),
            encoding,
            calibrator,
        })
    }

    fn build_enumerated(&self, path: &[String], x: &EnumeratedTypeXml) -> Result<(BaseType, Vec<EnumLabel>), XmlError> {
        let base = self.build_integer_base(path, &IntegerTypeXml {
            name: x.name.clone(),
            unit_set: x.unit_set.clone(),
            encoding: clone_integer_encoding(&x.encoding),
            valid_range: None,
            valid_range_set: None,
            valid_range_applies_to_calibrated: None,
        })?;
        let labels = x
            .enumeration_list
            .enumeration
            .iter()
            .map(|e| EnumLabel { value: e.value, max_value: e.max_value.unwrap_or(e.value), label: e.label.clone() })
            .collect();
        Ok((base, labels))
    }

    fn build_boolean_base(&self, path: &[String], x: &BooleanTypeXml) -> Result<BaseType, XmlError> {
        let encoding_xml = match &x.encoding {
            Some(e) => clone_integer_encoding(e),
            None => IntegerEncodingXml { size_in_bits: 1, encoding: "unsigned".to_string(), default_calibrator: None },
        };
        self.build_integer_base(path, &IntegerTypeXml {
            name: x.name.clone(),
            unit_set: x.unit_set.clone(),
            encoding: encoding_xml,
            valid_range: None,
            valid_range_set: None,
            valid_range_applies_to_calibrated: None,
        })
    }

    fn build_string_base(&self, path: &[String], x: &StringTypeXml) -> Result<BaseType, XmlError> {
        let charset = convert_charset(&x.encoding.charset, &x.name)?;
        let sizing = self.convert_string_sizing(path, &x.encoding, &x.name)?;
        Ok(BaseType {
            name: x.name.clone(),
            units: convert_unit_set(&x.unit_set),
            valid_range: None,
            encoding: DataEncoding::String { charset, sizing },
            calibrator: None,
        })
    }

    fn build_binary_base(&self, path: &[String], x: &BinaryTypeXml) -> Result<BaseType, XmlError> {
        let sizing = self.convert_binary_sizing(path, &x.encoding, &x.name)?;
        Ok(BaseType {
            name: x.name.clone(),
            units: convert_unit_set(&x.unit_set),
            valid_range: None,
            encoding: DataEncoding::Binary { sizing },
            calibrator: None,
        })
    }

    fn build_absolute_time(&self, path: &[String], x: &AbsoluteTimeTypeXml) -> Result<(BaseType, Epoch), XmlError> {
        let int_enc = x.encoding.as_ref().and_then(|e| e.integer_encoding.as_ref());
        if let Some(ie) = int_enc {
            if ie.size_in_bits != 32 || ie.encoding != "unsigned" {
                warn!("AbsoluteTimeParameterType/ArgumentType '{}' declares a non-default encoding; hardcoding to unsigned 32-bit per this engine's AbsoluteTime support", x.name);
            }
        }
        let base = self.build_integer_base(path, &IntegerTypeXml {
            name: x.name.clone(),
            unit_set: x.unit_set.clone(),
            encoding: IntegerEncodingXml { size_in_bits: 32, encoding: "unsigned".to_string(), default_calibrator: None },
            valid_range: None,
            valid_range_set: None,
            valid_range_applies_to_calibrated: None,
        })?;
        let epoch = match x.reference_time.as_ref().and_then(|r| r.epoch.as_deref()) {
            Some("TAI") => Epoch::Tai,
            Some("J2000") => Epoch::J2000,
            Some("UNIX") => Epoch::Unix,
            Some("GPS") => Epoch::Gps,
            Some(other) => Epoch::Custom(other.to_string()),
            None => Epoch::Unix,
        };
        Ok((base, epoch))
    }

    fn build_dimensions(&self, path: &[String], dims: &Option<DimensionListXml>) -> Result<Vec<ArraySize>, XmlError> {
        let Some(dims) = dims else { return Ok(Vec::new()) };
        let mut out = Vec::with_capacity(dims.dimension.len());
        for dim in &dims.dimension {
            let start = dim.starting_index.as_ref().and_then(|i| i.fixed_value).unwrap_or(0);
            match &dim.ending_index {
                Some(end) => {
                    if let Some(fixed) = end.fixed_value {
                        out.push(ArraySize::Fixed((fixed - start + 1).max(0) as usize));
                    }
                    else if let Some(dyn_val) = &end.dynamic_value {
                        let raw = &dyn_val.parameter_instance_ref.parameter_ref;
                        let Some((_, param)) = resolve_ref(&self.param_ids, path, raw) else {
                            return Err(dangling_reference::<()>(raw.clone(), "array dimension parameter").unwrap_err().into());
                        };
                        out.push(ArraySize::DynamicParam(param));
                    }
                }
                None => out.push(ArraySize::Fixed(0)),
            }
        }
        Ok(out)
    }

    fn convert_string_sizing(&self, path: &[String], enc: &StringEncodingXml, context: &str) -> Result<StringSizing, XmlError> {
        if let Some(term) = &enc.termination_char {
            let byte = term.bytes().next().unwrap_or(0);
            return Ok(StringSizing::Terminated { terminator: byte });
        }
        match &enc.size_in_bits {
            Some(StringSizeInBitsXml { fixed: Some(f), .. }) => Ok(StringSizing::Fixed { bits: f.fixed_value }),
            Some(StringSizeInBitsXml { variable: Some(v), .. }) => {
                let raw = &v.dynamic_value.parameter_instance_ref.parameter_ref;
                let Some((_, size_param)) = resolve_ref(&self.param_ids, path, raw) else {
                    return Err(dangling_reference::<()>(raw.clone(), "string size parameter").unwrap_err().into());
                };
                let size_is_of = match v.size_in_bits_is_of.as_str() {
                    "stringData" => SizeIsOf::StringData,
                    "characterCount" => SizeIsOf::StringLengthInCharacters,
                    other => {
                        warn!("unrecognized sizeInBitsIsOf '{other}' on '{context}', defaulting to stringData");
                        SizeIsOf::StringData
                    }
                };
                Ok(StringSizing::Dynamic { size_param, size_is_of })
            }
            _ => {
                warn!("string type '{context}' declares no SizeInBits; defaulting to a null-terminated string");
                Ok(StringSizing::Terminated { terminator: 0 })
            }
        }
    }

    fn convert_binary_sizing(&self, path: &[String], enc: &BinaryEncodingXml, context: &str) -> Result<BinarySizing, XmlError> {
        if let Some(bits) = enc.size_in_bits.fixed_value {
            return Ok(BinarySizing::Fixed { bits });
        }
        if let Some(dyn_val) = &enc.size_in_bits.dynamic_value {
            let raw = &dyn_val.parameter_instance_ref.parameter_ref;
            let Some((_, size_param)) = resolve_ref(&self.param_ids, path, raw) else {
                return Err(dangling_reference::<()>(raw.clone(), "binary size parameter").unwrap_err().into());
            };
            return Ok(BinarySizing::Dynamic { size_param });
        }
        Err(unsupported_construct::<()>("binary encoding without a size", context.to_string()).unwrap_err().into())
    }

    fn process_containers_and_commands(&mut self, builder: &mut SchemaBuilder) -> Result<(), XmlError> {
        let mut node_keys: Vec<String> = Vec::new();
        let mut deps: HashMap<String, Vec<String>> = HashMap::new();

        for q in self.containers.keys() {
            node_keys.push(format!("c:{q}"));
        }
        for q in self.meta_commands.keys() {
            node_keys.push(format!("m:{q}"));
        }

        for (q, c) in &self.containers {
            let path = &self.container_paths[q];
            let mut d = Vec::new();
            if let Some(base) = &c.base_container {
                if let Some((key, _)) = resolve_ref(&unit_registry(&self.containers), path, &base.container_ref) {
                    d.push(format!("c:{key}"));
                }
            }
            if let Some(el) = &c.entry_list {
                for e in &el.entries {
                    if let EntryKindXml::ContainerRefEntry(cr) = e {
                        if let Some((key, _)) = resolve_ref(&unit_registry(&self.containers), path, &cr.container_ref) {
                            d.push(format!("c:{key}"));
                        }
                    }
                }
            }
            deps.insert(format!("c:{q}"), d);
        }
        for (q, mc) in &self.meta_commands {
            let path = &self.meta_command_paths[q];
            let mut d = Vec::new();
            if let Some(base) = &mc.base_meta_command {
                if let Some((key, _)) = resolve_ref(&unit_registry(&self.meta_commands), path, &base.meta_command_ref) {
                    d.push(format!("m:{key}"));
                }
            }
            deps.insert(format!("m:{q}"), d);
        }

        let order = topo_sort(&node_keys, &deps).ok_or_else(|| {
            XmlError::Schema(xtce_core::Error::Schema(xtce_core::error::SchemaError::CyclicInheritance {
                container: "base container, container-ref, or base meta-command cycle".to_string(),
            }))
        })?;

        for key in order {
            if let Some(q) = key.strip_prefix("c:") {
                self.build_container(builder, q)?;
            }
            else if let Some(q) = key.strip_prefix("m:") {
                self.build_meta_command(builder, q)?;
            }
        }

        Ok(())
    }

    fn build_container(&mut self, builder: &mut SchemaBuilder, q: &str) -> Result<(), XmlError> {
        let path = self.container_paths[q].clone();
        let c = self.containers[q];

        let base = match &c.base_container {
            Some(b) => {
                let Some((_, id)) = resolve_ref(&self.container_ids, &path, &b.container_ref) else {
                    return Err(dangling_reference::<()>(c.name.clone(), b.container_ref.clone()).unwrap_err().into());
                };
                Some(id)
            }
            None => None,
        };
        let restriction = match c.base_container.as_ref().and_then(|b| b.restriction_criteria.as_ref()) {
            Some(rc) => Some(self.build_comparison_list(&path, rc)?),
            None => None,
        };
        let own_entries = match &c.entry_list {
            Some(el) => self.build_entries(&path, &el.entries, EntryOwner::Container)?,
            None => Vec::new(),
        };

        let id = builder.add_container(q, base, restriction, own_entries)?;
        self.container_ids.insert(q.to_string(), id);
        Ok(())
    }

    fn build_meta_command(&mut self, builder: &mut SchemaBuilder, q: &str) -> Result<(), XmlError> {
        let path = self.meta_command_paths[q].clone();
        let mc = self.meta_commands[q];

        let base = match &mc.base_meta_command {
            Some(b) => {
                let Some((_, id)) = resolve_ref(&self.meta_command_ids, &path, &b.meta_command_ref) else {
                    return Err(dangling_reference::<()>(mc.name.clone(), b.meta_command_ref.clone()).unwrap_err().into());
                };
                Some(id)
            }
            None => None,
        };
        let own_entries = match mc.command_container.as_ref().and_then(|cc| cc.entry_list.as_ref()) {
            Some(el) => self.build_entries(&[q.to_string()], &el.entries, EntryOwner::MetaCommand)?,
            None => Vec::new(),
        };

        let id = builder.add_meta_command(q, base, own_entries)?;
        self.meta_command_ids.insert(q.to_string(), id);
        Ok(())
    }

    fn build_entries(&self, ref_path: &[String], entries: &[EntryKindXml], owner: EntryOwner) -> Result<Vec<Entry>, XmlError> {
        let mut out = Vec::with_capacity(entries.len());
        for e in entries {
            let entry = match e {
                EntryKindXml::ParameterRefEntry(pr) => {
                    if owner == EntryOwner::MetaCommand {
                        unsupported_construct::<()>("ParameterRefEntry in a MetaCommand", ref_path.join("/"))?;
                    }
                    let Some((_, param)) = resolve_ref(&self.param_ids, ref_path, &pr.parameter_ref) else {
                        return Err(dangling_reference::<()>(ref_path.join("/"), pr.parameter_ref.clone()).unwrap_err().into());
                    };
                    let location = pr.location.as_ref().map(|l| Location {
                        reference: match l.reference_location.as_str() {
                            "containerStart" => ReferenceLocation::ContainerStart,
                            _ => ReferenceLocation::PreviousEntry,
                        },
                        offset_bits: l.fixed_value,
                    });
                    Entry::ParameterRef { param, location }
                }
                EntryKindXml::ArgumentRefEntry(ar) => {
                    if owner == EntryOwner::Container {
                        unsupported_construct::<()>("ArgumentRefEntry in a SequenceContainer", ref_path.join("/"))?;
                    }
                    let Some((_, arg)) = resolve_ref(&self.arg_ids, ref_path, &ar.argument_ref) else {
                        return Err(dangling_reference::<()>(ref_path.join("/"), ar.argument_ref.clone()).unwrap_err().into());
                    };
                    Entry::ArgumentRef { arg }
                }
                EntryKindXml::ContainerRefEntry(cr) => {
                    if owner == EntryOwner::MetaCommand {
                        unsupported_construct::<()>("ContainerRefEntry in a MetaCommand", ref_path.join("/"))?;
                    }
                    let Some((_, container)) = resolve_ref(&self.container_ids, ref_path, &cr.container_ref) else {
                        return Err(dangling_reference::<()>(ref_path.join("/"), cr.container_ref.clone()).unwrap_err().into());
                    };
                    let include_condition = match &cr.include_condition {
                        Some(wrapper) => Some(self.build_comparison_list(ref_path, wrapper)?),
                        None => None,
                    };
                    Entry::ContainerRef { container, include_condition }
                }
                EntryKindXml::FixedValueEntry(fv) => {
                    let value = parse_hex(&fv.binary_value);
                    Entry::FixedValue { size_in_bits: fv.size_in_bits, value }
                }
            };
            out.push(entry);
        }
        Ok(out)
    }

    fn build_comparison_list(&self, path: &[String], wrapper: &ComparisonListWrapperXml) -> Result<ComparisonList, XmlError> {
        let mut comparisons = Vec::new();
        for c in wrapper.comparison.iter().chain(wrapper.comparison_list.iter().flat_map(|l| l.comparison.iter())) {
            let Some((_, param)) = resolve_ref(&self.param_ids, path, &c.parameter_ref) else {
                return Err(dangling_reference::<()>(path.join("/"), c.parameter_ref.clone()).unwrap_err().into());
            };
            let op = parse_operator(&c.comparison_operator)?;
            comparisons.push(Comparison {
                param,
                op,
                value: c.value.clone(),
                use_calibrated_value: c.use_calibrated_value,
            });
        }
        Ok(ComparisonList(comparisons))
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum EntryOwner {
    Container,
    MetaCommand,
}

fn unit_registry<K: std::hash::Hash + Eq + Clone, V>(map: &HashMap<K, V>) -> HashMap<K, ()> {
    map.keys().cloned().map(|k| (k, ())).collect()
}

fn param_type_name(ty: &ParameterTypeKindXml) -> Option<&str> {
    match ty {
        ParameterTypeKindXml::IntegerParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::FloatParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::EnumeratedParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::BooleanParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::StringParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::BinaryParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::AbsoluteTimeParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::ArrayParameterType(x) => Some(&x.name),
        ParameterTypeKindXml::AggregateParameterType(_) | ParameterTypeKindXml::RelativeTimeParameterType(_) => None,
    }
}

fn arg_type_name(ty: &ArgumentTypeKindXml) -> Option<&str> {
    match ty {
        ArgumentTypeKindXml::IntegerArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::FloatArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::EnumeratedArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::BooleanArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::StringArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::BinaryArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::AbsoluteTimeArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::ArrayArgumentType(x) => Some(&x.name),
        ArgumentTypeKindXml::AggregateArgumentType(_) | ArgumentTypeKindXml::RelativeTimeArgumentType(_) => None,
    }
}

fn convert_unit_set(units: &Option<UnitSetXml>) -> Vec<String> {
    units.as_ref().map(|u| u.unit.iter().map(|x| x.text.clone()).collect()).unwrap_or_default()
}

fn convert_valid_range_single(vr: &ValidRangeXml, default_applies_to_calibrated: bool) -> ValidRange {
    let (min, min_inclusive) = match (vr.min_inclusive, vr.min_exclusive) {
        (Some(v), _) => (Some(v), true),
        (None, Some(v)) => (Some(v), false),
        (None, None) => (None, true),
    };
    let (max, max_inclusive) = match (vr.max_inclusive, vr.max_exclusive) {
        (Some(v), _) => (Some(v), true),
        (None, Some(v)) => (Some(v), false),
        (None, None) => (None, true),
    };
    ValidRange { min, max, min_inclusive, max_inclusive, applies_to_calibrated: vr.applies_to_calibrated.unwrap_or(default_applies_to_calibrated) }
}

fn pick_valid_range(
    valid_range: &Option<ValidRangeXml>,
    valid_range_set: &Option<ValidRangeSetXml>,
    applies_default: Option<bool>,
) -> Option<ValidRange> {
    if let Some(vr) = valid_range {
        return Some(convert_valid_range_single(vr, applies_default.unwrap_or(true)));
    }
    if let Some(set) = valid_range_set {
        if let Some(vr) = set.valid_range.first() {
            return Some(convert_valid_range_single(vr, applies_default.unwrap_or(true)));
        }
    }
    None
}

fn convert_calibrator(xml: &Option<CalibratorXml>) -> Option<Calibrator> {
    xml.as_ref().map(|c| {
        Calibrator::Polynomial(PolynomialCalibrator { terms: c.polynomial.term.iter().map(|t| (t.coefficient, t.exponent)).collect() })
    })
}

fn clone_integer_encoding(xml: &IntegerEncodingXml) -> IntegerEncodingXml {
    IntegerEncodingXml {
        size_in_bits: xml.size_in_bits,
        encoding: xml.encoding.clone(),
        default_calibrator: xml.default_calibrator.as_ref().map(|c| CalibratorXml {
            polynomial: PolynomialCalibratorXml {
                term: c.polynomial.term.iter().map(|t| TermXml { coefficient: t.coefficient, exponent: t.exponent }).collect(),
            },
        }),
    }
}

fn convert_integer_encoding(xml: &IntegerEncodingXml, context: &str) -> Result<(DataEncoding, Option<Calibrator>), XmlError> {
    let signed = match xml.encoding.as_str() {
        "unsigned" => IntegerSigned::Unsigned,
        "twosComplement" => IntegerSigned::TwosComplement,
        other => {
            warn!("unsupported integer encoding '{other}' on '{context}'");
            unsupported_construct::<IntegerSigned>("integer encoding", context.to_string())?
        }
    };
    Ok((DataEncoding::Integer { size_in_bits: xml.size_in_bits, signed }, convert_calibrator(&xml.default_calibrator)))
}

fn convert_float_type_encoding(xml: &FloatTypeXml) -> Result<(DataEncoding, Option<Calibrator>), XmlError> {
    if let Some(fe) = &xml.float_encoding {
        Ok((DataEncoding::Float { size_in_bits: fe.size_in_bits }, convert_calibrator(&fe.default_calibrator)))
    }
    else if let Some(ie) = &xml.integer_encoding {
        convert_integer_encoding(ie, &xml.name)
    }
    else {
        warn!("float type '{}' declares no encoding; defaulting to 32-bit IEEE-754", xml.name);
        Ok((DataEncoding::Float { size_in_bits: 32 }, None))
    }
}

fn convert_charset(raw: &str, context: &str) -> Result<CharSet, XmlError> {
    Ok(match raw {
        "UTF-8" => CharSet::Utf8,
        "UTF-16BE" => CharSet::Utf16Be,
        "US-ASCII" => CharSet::UsAscii,
        "ISO-8859-1" => CharSet::Iso8859_1,
        "windows-1252" | "Windows-1252" => CharSet::Windows1252,
        other => {
            warn!("unsupported character set '{other}' on '{context}'");
            unsupported_construct::<CharSet>("character set", context.to_string())?
        }
    })
}

fn parse_operator(raw: &str) -> Result<CompareOp, XmlError> {
    Ok(match raw {
        "==" | "equalTo" => CompareOp::Eq,
        "!=" | "notEqualTo" => CompareOp::Ne,
        "<" | "lessThan" => CompareOp::Lt,
        "<=" | "lessThanOrEqualTo" => CompareOp::Le,
        ">" | "greaterThan" => CompareOp::Gt,
        ">=" | "greaterThanOrEqualTo" => CompareOp::Ge,
        other => unsupported_construct::<CompareOp>("comparison operator", other.to_string())?,
    })
}

fn parse_hex(raw: &str) -> Vec<u8> {
    let digits = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")).unwrap_or(raw);
    let mut digits = digits.to_string();
    if digits.len() % 2 != 0 {
        digits.insert(0, '0');
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0))
        .collect()
}

//! Metadata introspection: from a type's declared metadata to an ordered
//! property list.
//!
//! ## Ordering
//!
//! Properties are stable-sorted by sort key, then partitioned into role
//! buckets and concatenated Structural → NonStructural →
//! TraversableAssociation. Within a bucket the order is ascending sort key,
//! ties broken by declaration order. Buckets never interleave, even when sort
//! keys overlap across roles.
//!
//! ## Conflicting declarations
//!
//! A property may carry several declarations (a grouped declaration). The
//! first one is effective. When a later declaration disagrees on role or sort
//! key, the property is still described using the first declaration and a
//! [`MetadataConflict`] is recorded on the descriptor so the graph writer can
//! report it.
//!
//! Two properties sharing a wire name are a conflict too: the first declared
//! property keeps the name and the later ones are left out of the descriptor.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::metadata::{
    Graphable, PropertyDeclaration, PropertyMetadata, PropertyRole, StructureKind, TypeMetadata,
};

/// Capability to read one property from an instance of the described type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Accessor {
    slot: usize,
}

impl Accessor {
    /// Index of the property in the type's declared metadata.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

/// A property with exactly one effective role and sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub accessor: Accessor,
    pub name: &'static str,
    pub role: PropertyRole,
    pub sort_key: i32,
}

/// How the metadata of a property conflicts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictKind {
    /// Grouped declarations disagree on role or sort key.
    Declarations {
        /// The declaration that was applied (the first one).
        chosen: PropertyDeclaration,
        /// Later declarations that differ from the chosen one.
        discarded: Vec<PropertyDeclaration>,
    },
    /// Several properties share one wire name. The first declared one keeps
    /// the name; the others are left out of the descriptor.
    DuplicateName {
        /// Slot of the property that was kept.
        kept: usize,
        /// Slots of the properties that were left out.
        dropped: Vec<usize>,
    },
}

/// A property whose declared metadata is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataConflict {
    pub type_name: &'static str,
    pub property: &'static str,
    pub kind: ConflictKind,
}

impl MetadataConflict {
    /// Human-readable description of how the conflict was resolved.
    pub fn message(&self) -> String {
        match &self.kind {
            ConflictKind::Declarations { chosen, discarded } => {
                let discarded = discarded
                    .iter()
                    .map(|d| format!("{}/{}", d.role.as_str(), d.sort_key))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "property '{}' of {} declares conflicting metadata; using first declaration {}/{}, discarding {}",
                    self.property,
                    self.type_name,
                    chosen.role.as_str(),
                    chosen.sort_key,
                    discarded
                )
            }
            ConflictKind::DuplicateName { kept, dropped } => {
                let dropped = dropped
                    .iter()
                    .map(|slot| slot.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                format!(
                    "wire name '{}' of {} is declared by several properties; keeping slot {}, dropping slots {}",
                    self.property, self.type_name, kept, dropped
                )
            }
        }
    }
}

/// Ordered, immutable description of a graphable type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub type_name: &'static str,
    pub element_name: &'static str,
    pub structure_kind: StructureKind,
    properties: Vec<PropertyDescriptor>,
    conflicts: Vec<MetadataConflict>,
}

impl TypeDescriptor {
    /// Properties in emission order.
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Conflicting declarations resolved while building the descriptor.
    pub fn conflicts(&self) -> &[MetadataConflict] {
        &self.conflicts
    }

    /// Looks up a property by wire name.
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Returns true if the type is a valid document root.
    pub fn is_entry_point(&self) -> bool {
        self.structure_kind.is_entry_point()
    }
}

/// Describes `T` from its declared metadata.
pub fn describe<T: Graphable>() -> TypeDescriptor {
    describe_metadata(T::type_metadata())
}

/// Describes a type from a metadata table.
pub fn describe_metadata(metadata: &TypeMetadata) -> TypeDescriptor {
    let mut conflicts = Vec::new();
    let duplicates = duplicate_names(metadata);
    let mut described: Vec<PropertyDescriptor> = metadata
        .properties
        .iter()
        .enumerate()
        .filter(|(slot, _)| !duplicates.iter().any(|(_, dropped)| dropped.contains(slot)))
        .map(|(slot, property)| {
            let (effective, conflict) = resolve_declarations(metadata.type_name, property);
            if let Some(conflict) = conflict {
                warn!(
                    type_name = metadata.type_name,
                    property = property.name,
                    "Conflicting property metadata, first declaration applied"
                );
                conflicts.push(conflict);
            }
            PropertyDescriptor {
                accessor: Accessor { slot },
                name: property.name,
                role: effective.role,
                sort_key: effective.sort_key,
            }
        })
        .collect();

    for (kept, dropped) in duplicates {
        let property = metadata.properties[kept].name;
        warn!(
            type_name = metadata.type_name,
            property, "Duplicate wire name, first property kept"
        );
        conflicts.push(MetadataConflict {
            type_name: metadata.type_name,
            property,
            kind: ConflictKind::DuplicateName { kept, dropped },
        });
    }

    // Vec::sort_by_key is stable: equal keys keep declaration order
    described.sort_by_key(|p| p.sort_key);

    let mut structural = Vec::with_capacity(described.len());
    let mut non_structural = Vec::new();
    let mut traversable = Vec::new();
    for property in described {
        match property.role {
            PropertyRole::Structural => structural.push(property),
            PropertyRole::NonStructural => non_structural.push(property),
            PropertyRole::TraversableAssociation => traversable.push(property),
        }
    }

    let mut properties = structural;
    properties.extend(non_structural);
    properties.extend(traversable);

    TypeDescriptor {
        type_name: metadata.type_name,
        element_name: metadata.element_name,
        structure_kind: metadata.structure_kind,
        properties,
        conflicts,
    }
}

/// Groups the slots of properties sharing a wire name: the first slot of
/// each group, then the later ones.
fn duplicate_names(metadata: &TypeMetadata) -> Vec<(usize, Vec<usize>)> {
    let mut groups: Vec<(usize, Vec<usize>)> = Vec::new();
    for (slot, property) in metadata.properties.iter().enumerate() {
        let Some(first) = metadata.properties[..slot]
            .iter()
            .position(|other| other.name == property.name)
        else {
            continue;
        };
        match groups.iter_mut().find(|(kept, _)| *kept == first) {
            Some((_, dropped)) => dropped.push(slot),
            None => groups.push((first, vec![slot])),
        }
    }
    groups
}

/// Picks the effective declaration of a property.
fn resolve_declarations(
    type_name: &'static str,
    property: &PropertyMetadata,
) -> (PropertyDeclaration, Option<MetadataConflict>) {
    let Some((first, rest)) = property.declarations.split_first() else {
        return (PropertyDeclaration::UNCLASSIFIED, None);
    };

    let discarded: Vec<PropertyDeclaration> =
        rest.iter().filter(|d| *d != first).copied().collect();
    if discarded.is_empty() {
        return (*first, None);
    }

    let conflict = MetadataConflict {
        type_name,
        property: property.name,
        kind: ConflictKind::Declarations {
            chosen: *first,
            discarded,
        },
    };
    (*first, Some(conflict))
}

/// Read-mostly cache of type descriptors keyed by the address of the
/// type's static metadata table.
///
/// Type names are not unique (two function-local types may share a module
/// path and identifier); every derived type owns a distinct static table.
/// Descriptors are pure functions of static metadata, so a racing second
/// population computes the same value; the first insert wins.
#[derive(Default)]
pub struct DescriptorCache {
    descriptors: RwLock<HashMap<usize, Arc<TypeDescriptor>>>,
}

impl DescriptorCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> &'static DescriptorCache {
        static GLOBAL: Lazy<DescriptorCache> = Lazy::new(DescriptorCache::new);
        &GLOBAL
    }

    /// Returns the descriptor for `metadata`, deriving it on first use.
    pub fn describe(&self, metadata: &'static TypeMetadata) -> Arc<TypeDescriptor> {
        let key = metadata as *const TypeMetadata as usize;
        if let Some(descriptor) = self.descriptors.read().get(&key) {
            return Arc::clone(descriptor);
        }

        debug!(type_name = metadata.type_name, "Describing type");
        let descriptor = Arc::new(describe_metadata(metadata));

        let mut descriptors = self.descriptors.write();
        Arc::clone(descriptors.entry(key).or_insert(descriptor))
    }

    /// Returns the number of cached descriptors.
    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    /// Returns true if nothing has been described yet.
    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }
}

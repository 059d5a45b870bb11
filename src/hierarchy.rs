use serde::Serialize;
use tracing::warn;

use crate::error::{GraphError, Result};
use crate::expansion::{ExpansionState, NodeKey};
use crate::model::{Entity, EntityKind, ViewMode};
use crate::resolver::EntityResolver;

type TraversalTemplate = &'static [&'static [EntityKind]];

const USER_TEMPLATE: TraversalTemplate = &[&[EntityKind::UserGroup], &[EntityKind::Role]];
const USER_GROUP_TEMPLATE: TraversalTemplate = &[&[EntityKind::User, EntityKind::Role]];
const ROLE_TEMPLATE: TraversalTemplate = &[&[EntityKind::UserGroup], &[EntityKind::User]];

pub fn traversal_template(mode: ViewMode) -> TraversalTemplate {
    match mode {
        ViewMode::User => USER_TEMPLATE,
        ViewMode::UserGroup => USER_GROUP_TEMPLATE,
        ViewMode::Role => ROLE_TEMPLATE,
    }
}

pub fn template_depth(mode: ViewMode) -> usize {
    traversal_template(mode).len()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    pub key: NodeKey,
    pub kind: EntityKind,
    pub id: String,
    pub name: String,
    pub level: usize,
    pub has_children: bool,
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Depth-first, pre-order list of this node and every revealed descendant.
    pub fn flatten(&self) -> Vec<&TreeNode> {
        let mut nodes = vec![self];
        for child in self.children.iter().flatten() {
            nodes.extend(child.flatten());
        }
        nodes
    }

    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DanglingReference {
    pub parent_kind: EntityKind,
    pub parent_id: String,
    pub kind: EntityKind,
    pub id: String,
}

impl From<DanglingReference> for GraphError {
    fn from(reference: DanglingReference) -> Self {
        Self::DanglingReference {
            parent_kind: reference.parent_kind,
            parent_id: reference.parent_id,
            kind: reference.kind,
            id: reference.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeDescription {
    pub view_mode: ViewMode,
    pub root: TreeNode,
    pub omitted: Vec<DanglingReference>,
}

impl TreeDescription {
    pub fn depth(&self) -> usize {
        self.root
            .flatten()
            .iter()
            .map(|node| node.level)
            .max()
            .unwrap_or_default()
    }
}

/// Builds the tree rooted at `(root_kind, root_id)` using the view mode of the same kind.
///
/// Children are only resolved for expanded nodes; collapsed nodes report `has_children` from
/// their raw relationship sets. Ids that fail to resolve are dropped, logged, and listed in
/// `omitted`.
pub fn build_hierarchy<R>(
    resolver: &R,
    root_kind: EntityKind,
    root_id: &str,
    expansion: &ExpansionState,
) -> Result<TreeDescription>
where
    R: EntityResolver + ?Sized,
{
    let view_mode = ViewMode::from(root_kind);
    let root_entity = resolver.resolve(root_kind, root_id)?;
    let mut builder = TreeBuilder {
        resolver,
        template: traversal_template(view_mode),
        expansion,
        omitted: Vec::new(),
    };
    let root = builder.build_node(root_entity, 0);

    Ok(TreeDescription {
        view_mode,
        root,
        omitted: builder.omitted,
    })
}

pub fn full_expansion<R>(
    resolver: &R,
    root_kind: EntityKind,
    root_id: &str,
) -> Result<ExpansionState>
where
    R: EntityResolver + ?Sized,
{
    let mut expansion = ExpansionState::default();
    for _ in 0..=template_depth(ViewMode::from(root_kind)) {
        let tree = build_hierarchy(resolver, root_kind, root_id, &expansion)?;
        let collapsed = tree
            .root
            .flatten()
            .into_iter()
            .filter(|node| node.has_children && !node.expanded)
            .map(|node| node.key.clone())
            .collect::<Vec<_>>();
        if collapsed.is_empty() {
            break;
        }
        for key in collapsed {
            expansion.expand(key);
        }
    }
    Ok(expansion)
}

struct TreeBuilder<'a, R: ?Sized> {
    resolver: &'a R,
    template: TraversalTemplate,
    expansion: &'a ExpansionState,
    omitted: Vec<DanglingReference>,
}

impl<R> TreeBuilder<'_, R>
where
    R: EntityResolver + ?Sized,
{
    fn build_node(&mut self, entity: &Entity, level: usize) -> TreeNode {
        let resolver = self.resolver;
        let key = NodeKey::new(entity.kind(), entity.id());
        let child_kinds = self.template.get(level).copied().unwrap_or_default();
        let has_children = child_kinds
            .iter()
            .any(|kind| !entity.related(*kind).is_empty());
        let expanded = self.expansion.is_expanded(&key);

        let children = if expanded && has_children {
            let mut children = Vec::new();
            for &child_kind in child_kinds {
                for child_id in entity.related(child_kind) {
                    match resolver.resolve(child_kind, child_id) {
                        Ok(child) => children.push(self.build_node(child, level + 1)),
                        Err(_) => self.omit(entity, child_kind, child_id),
                    }
                }
            }
            Some(children)
        } else {
            None
        };

        TreeNode {
            key,
            kind: entity.kind(),
            id: entity.id().to_owned(),
            name: entity.name().to_owned(),
            level,
            has_children,
            expanded,
            children,
        }
    }

    fn omit(&mut self, parent: &Entity, kind: EntityKind, id: &str) {
        warn!(
            parent_kind = %parent.kind(),
            parent_id = %parent.id(),
            kind = %kind,
            id = %id,
            "dropping dangling reference from hierarchy"
        );
        self.omitted.push(DanglingReference {
            parent_kind: parent.kind(),
            parent_id: parent.id().to_owned(),
            kind,
            id: id.to_owned(),
        });
    }
}

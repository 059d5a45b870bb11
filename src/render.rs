use std::fmt::Write as _;

use crate::drilldown::RoleDrilldownView;
use crate::hierarchy::{TreeDescription, TreeNode};
use crate::model::Entity;
use crate::stats::StoreStats;
use crate::store::integrity::IntegrityViolation;

const INDENT: &str = "  ";

/// Plain-text tree, one node per line.
///
/// `▾` marks an expanded node, `▸` a collapsed node with children, `·` a leaf.
pub fn render_tree(tree: &TreeDescription) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} view", tree.view_mode.label());
    for node in tree.root.flatten() {
        push_node(&mut out, node);
    }
    if !tree.omitted.is_empty() {
        let _ = writeln!(out, "omitted {} dangling reference(s):", tree.omitted.len());
        for reference in &tree.omitted {
            let _ = writeln!(
                out,
                "{INDENT}{} `{}` -> {} `{}`",
                reference.parent_kind, reference.parent_id, reference.kind, reference.id
            );
        }
    }
    out
}

fn push_node(out: &mut String, node: &TreeNode) {
    let marker = match (node.has_children, node.expanded) {
        (false, _) => '·',
        (true, true) => '▾',
        (true, false) => '▸',
    };
    let _ = writeln!(
        out,
        "{}{marker} {} [{} {}]",
        INDENT.repeat(node.level),
        node.name,
        node.kind.label(),
        node.id
    );
}

pub fn render_entities(entities: &[&Entity]) -> String {
    if entities.is_empty() {
        return "no matches\n".to_owned();
    }
    entities
        .iter()
        .map(|entity| format!("{}\t{}\n", entity.id(), entity.name()))
        .collect()
}

pub fn render_stats(stats: &StoreStats) -> String {
    format!(
        "users:        {}\nuser groups:  {}\nroles:        {}\ntotal items:  {}\nlinks:        {}\n",
        stats.users, stats.user_groups, stats.roles, stats.total_entities, stats.links
    )
}

pub fn render_violations(violations: &[IntegrityViolation]) -> String {
    if violations.is_empty() {
        return "ok: all references are symmetric and resolve\n".to_owned();
    }
    let mut out = format!("{} integrity violation(s):\n", violations.len());
    for violation in violations {
        let line = match violation {
            IntegrityViolation::Asymmetric {
                from_kind,
                from_id,
                to_kind,
                to_id,
            } => format!("{from_kind} `{from_id}` -> {to_kind} `{to_id}` has no back-reference"),
            IntegrityViolation::Dangling {
                from_kind,
                from_id,
                missing_kind,
                missing_id,
            } => format!(
                "{from_kind} `{from_id}` references missing {missing_kind} `{missing_id}`"
            ),
        };
        let _ = writeln!(out, "{INDENT}{line}");
    }
    out
}

pub fn render_drilldown(view: &RoleDrilldownView) -> String {
    let mut out = format!("roles ({}):\n", view.roles.len());
    for role in &view.roles {
        let marker = if view.selected_role.as_deref() == Some(role.role_id.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(
            out,
            "{marker} {} [{}] {} groups, {} users",
            role.role_name, role.role_id, role.user_groups, role.total_users
        );
    }

    if view.selected_role.is_some() {
        let _ = writeln!(out, "user groups ({}):", view.groups.len());
        for group in &view.groups {
            let marker = if view.selected_group.as_deref() == Some(group.id.as_str()) {
                '>'
            } else {
                ' '
            };
            let _ = writeln!(out, "{marker} {} [{}] {} users", group.name, group.id, group.users);
        }
    }

    if view.selected_group.is_some() {
        let _ = writeln!(out, "users ({}):", view.users.len());
        for user in &view.users {
            let _ = writeln!(
                out,
                "{INDENT}{} [{}] member of {} groups",
                user.name, user.id, user.user_groups
            );
        }
    }

    if let Some(summary) = view.summary {
        let selected = summary
            .selected_group_users
            .map_or_else(|| "-".to_owned(), |count| count.to_string());
        let _ = writeln!(
            out,
            "summary: {} user groups, {} total users, {selected} selected group users",
            summary.user_groups, summary.total_users
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use crate::drilldown::RoleDrilldown;
    use crate::expansion::NodeKey;
    use crate::hierarchy::build_hierarchy;
    use crate::model::EntityKind;
    use crate::stats::StoreStats;
    use crate::store::integrity::IntegrityViolation;
    use crate::store::seed::default_seed;
    use crate::store::{EntityStore, StoreConfig};

    use super::{render_drilldown, render_stats, render_tree, render_violations};

    #[test]
    fn tree_lines_show_markers_and_indentation() {
        let store = seeded_store();
        let expansion = [
            NodeKey::new(EntityKind::UserGroup, "ug-3"),
            NodeKey::new(EntityKind::User, "user-2"),
        ]
        .into_iter()
        .collect();
        let tree = build_hierarchy(&store, EntityKind::UserGroup, "ug-3", &expansion)
            .expect("hierarchy should build");

        assert_eq!(
            render_tree(&tree),
            "User Group view\n▾ Payroll - I [user group ug-3]\n  · DEF [user user-2]\n  · Team Lead [role role-3]\n"
        );
    }

    #[test]
    fn stats_and_clean_check_render() {
        let store = seeded_store();
        let stats = render_stats(&StoreStats::collect(&store));
        assert!(stats.contains("total items:  9"));
        assert!(render_violations(&[]).starts_with("ok"));

        let rendered = render_violations(&[IntegrityViolation::Dangling {
            from_kind: EntityKind::Role,
            from_id: "r1".to_owned(),
            missing_kind: EntityKind::UserGroup,
            missing_id: "g9".to_owned(),
        }]);
        assert!(rendered.contains("Role `r1` references missing UserGroup `g9`"));
    }

    #[test]
    fn drilldown_marks_selection() {
        let store = seeded_store();
        let mut drilldown = RoleDrilldown::default();
        drilldown
            .select_role(&store, "role-1")
            .expect("role should be selectable");
        let view = drilldown.view(&store, "").expect("view should build");

        let rendered = render_drilldown(&view);
        assert!(rendered.contains("> Admin [role-1] 1 groups, 2 users"));
        assert!(rendered.contains("  Finance - I [ug-1] 2 users"));
        assert!(rendered.contains("summary: 1 user groups, 2 total users, - selected group users"));
        assert!(!rendered.contains("users ("));
    }

    fn seeded_store() -> EntityStore {
        EntityStore::from_seed(&default_seed(), StoreConfig::default())
            .expect("default seed should load")
    }
}

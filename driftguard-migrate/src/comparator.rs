//! Structure comparator
//!
//! Diffs the live structure of a table against the structure recorded by
//! its migration history. The resulting [`Blueprint`] moves the historical
//! state onto the current one; its down changes move it back.

use driftguard::plan::{Blueprint, Change};
use driftguard::schema::{Column, ColumnKind, DefaultValue, Dialect, Length, PrimaryKey, Table};
use driftguard::{ForeignKey, Result};

use crate::renderer::primary_key_name;

/// Everything about a column that decides whether it must be altered,
/// comments excluded
#[derive(Debug, Clone, PartialEq, Eq)]
struct Profile {
    kind: ColumnKind,
    length: Option<Length>,
    not_null: bool,
    unique: bool,
    unsigned: bool,
    default: Option<DefaultValue>,
    auto_increment: bool,
    append: Option<String>,
}

impl Profile {
    fn of(column: &Column, dialect: Dialect) -> Self {
        Self {
            kind: column.kind.storage(),
            length: column.effective_length(dialect),
            not_null: column.is_not_null(),
            unique: column.unique,
            unsigned: column.is_unsigned(),
            default: column.default.clone(),
            auto_increment: column.is_auto_increment(),
            append: column.append_spec().rest,
        }
    }

    /// Human-readable list of the attributes that differ from `before`
    fn changes_from(&self, before: &Profile) -> Vec<String> {
        let mut out = Vec::new();
        if self.kind != before.kind {
            out.push(format!("type ({} → {})", before.kind, self.kind));
        }
        if self.length != before.length {
            out.push(format!("length ({} → {})", show(&before.length), show(&self.length)));
        }
        if self.not_null != before.not_null {
            out.push(format!("not null ({} → {})", before.not_null, self.not_null));
        }
        if self.unique != before.unique {
            out.push(format!("unique ({} → {})", before.unique, self.unique));
        }
        if self.unsigned != before.unsigned {
            out.push(format!("unsigned ({} → {})", before.unsigned, self.unsigned));
        }
        if self.default != before.default {
            out.push(format!("default ({} → {})", show(&before.default), show(&self.default)));
        }
        if self.auto_increment != before.auto_increment {
            out.push(format!(
                "auto increment ({} → {})",
                before.auto_increment, self.auto_increment
            ));
        }
        if self.append != before.append {
            out.push(format!("append ({} → {})", show(&before.append), show(&self.append)));
        }
        out
    }
}

fn show<T: std::fmt::Display>(value: &Option<T>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "none".to_string(),
    }
}

/// Changes grouped by emission phase
#[derive(Default)]
struct Phases {
    drop_foreign_keys: Vec<(Change, Change)>,
    drop_indexes: Vec<(Change, Change)>,
    drop_primary_key: Vec<(Change, Change)>,
    drop_columns: Vec<(Change, Change)>,
    alter_columns: Vec<(Change, Change)>,
    add_columns: Vec<(Change, Change)>,
    add_primary_key: Vec<(Change, Change)>,
    create_indexes: Vec<(Change, Change)>,
    add_foreign_keys: Vec<(Change, Change)>,
    comments: Vec<(Change, Change)>,
}

impl Phases {
    fn into_blueprint(self, mut blueprint: Blueprint) -> Blueprint {
        let ordered = [
            self.drop_foreign_keys,
            self.drop_indexes,
            self.drop_primary_key,
            self.drop_columns,
            self.alter_columns,
            self.add_columns,
            self.add_primary_key,
            self.create_indexes,
            self.add_foreign_keys,
            self.comments,
        ];
        for (up, down) in ordered.into_iter().flatten() {
            blueprint.push(up, Some(down));
        }
        blueprint
    }
}

/// Compute the changes that turn `historical` into `current`
///
/// Both tables are read with `current`'s dialect. An empty blueprint means
/// history already matches the database.
///
/// # Errors
///
/// Returns `DriftError::UnsupportedOperation` when the dialect cannot
/// express one of the up changes.
pub fn compare(current: &Table, historical: &Table) -> Result<Blueprint> {
    let dialect = current.dialect;
    let table = current.name.clone();
    let short = current.short_name();
    let mut blueprint = Blueprint::new(&table);
    let mut phases = Phases::default();

    compare_columns(current, historical, &mut blueprint, &mut phases);
    compare_primary_key(current, historical, &short, &mut blueprint, &mut phases);
    compare_foreign_keys(current, historical, &short, &mut blueprint, &mut phases);
    compare_indexes(current, historical, &mut blueprint, &mut phases);

    let mut blueprint = phases.into_blueprint(blueprint);
    log::debug!(
        "Table '{}' ({}): {} difference(s)",
        table,
        dialect,
        blueprint.differences().len()
    );
    blueprint.apply_dialect_policy(dialect)?;
    Ok(blueprint)
}

fn compare_columns(current: &Table, historical: &Table, blueprint: &mut Blueprint, phases: &mut Phases) {
    let dialect = current.dialect;
    let table = &current.name;
    let tracks_position = dialect.tracks_column_position();

    for (i, column) in current.columns.iter().enumerate() {
        let Some(before) = historical.column(&column.name) else {
            let mut added = column.without_position();
            if tracks_position {
                added = match i {
                    0 => added.first(),
                    _ => added.after(current.columns[i - 1].name.clone()),
                };
            }
            blueprint.describe(format!("column '{}' added", column.name));
            phases.add_columns.push((
                Change::AddColumn {
                    table: table.clone(),
                    column: added,
                },
                Change::DropColumn {
                    table: table.clone(),
                    column: column.name.clone(),
                },
            ));
            continue;
        };

        let now = Profile::of(column, dialect);
        let then = Profile::of(before, dialect);
        if now != then {
            blueprint.describe(format!(
                "column '{}' changed: {}",
                column.name,
                now.changes_from(&then).join(", ")
            ));
            let mut altered = column.without_position();
            if !dialect.reports_comments() {
                // comments are unknown here; keep the recorded one
                altered.comment = before.comment.clone();
            }
            phases.alter_columns.push((
                Change::AlterColumn {
                    table: table.clone(),
                    column: altered,
                },
                Change::AlterColumn {
                    table: table.clone(),
                    column: before.without_position(),
                },
            ));
            continue;
        }

        if dialect.reports_comments() && column.comment != before.comment {
            blueprint.describe(format!(
                "column '{}' comment changed ({} → {})",
                column.name,
                show(&before.comment),
                show(&column.comment)
            ));
            phases.comments.push((
                comment_change(table, &column.name, &column.comment),
                comment_change(table, &column.name, &before.comment),
            ));
        }
    }

    // last column first: the inverses re-add in historical order
    for (i, before) in historical.columns.iter().enumerate().rev() {
        if current.has_column(&before.name) {
            continue;
        }
        let mut restored = before.without_position();
        if tracks_position {
            restored = match i {
                0 => restored.first(),
                _ => restored.after(historical.columns[i - 1].name.clone()),
            };
        }
        blueprint.describe(format!("column '{}' removed", before.name));
        phases.drop_columns.push((
            Change::DropColumn {
                table: table.clone(),
                column: before.name.clone(),
            },
            Change::AddColumn {
                table: table.clone(),
                column: restored,
            },
        ));
    }
}

fn comment_change(table: &str, column: &str, comment: &Option<String>) -> Change {
    match comment {
        Some(comment) => Change::AddComment {
            table: table.to_string(),
            column: column.to_string(),
            comment: comment.clone(),
        },
        None => Change::DropComment {
            table: table.to_string(),
            column: column.to_string(),
        },
    }
}

fn compare_primary_key(
    current: &Table,
    historical: &Table,
    short: &str,
    blueprint: &mut Blueprint,
    phases: &mut Phases,
) {
    let table = &current.name;
    let named = |key: &PrimaryKey| PrimaryKey {
        name: Some(key.name.clone().unwrap_or_else(|| primary_key_name(short))),
        columns: key.columns.clone(),
    };
    let add = |key: &PrimaryKey| Change::AddPrimaryKey {
        table: table.clone(),
        key: named(key),
    };
    let remove = |key: &PrimaryKey| Change::DropPrimaryKey {
        table: table.clone(),
        name: named(key).name.unwrap_or_default(),
    };

    match (&current.primary_key, &historical.primary_key) {
        (None, None) => {}
        (Some(now), None) => {
            blueprint.describe(format!("primary key ({}) added", now.columns.join(", ")));
            phases.add_primary_key.push((add(now), remove(now)));
        }
        (None, Some(then)) => {
            blueprint.describe(format!("primary key ({}) removed", then.columns.join(", ")));
            phases.drop_primary_key.push((remove(then), add(then)));
        }
        (Some(now), Some(then)) => {
            let renamed = matches!((&now.name, &then.name), (Some(a), Some(b)) if a != b);
            if !now.same_columns(then) || renamed {
                blueprint.describe(format!(
                    "primary key changed ({} → {})",
                    then.columns.join(", "),
                    now.columns.join(", ")
                ));
                phases.drop_primary_key.push((remove(then), add(then)));
                phases.add_primary_key.push((add(now), remove(now)));
            }
        }
    }
}

fn compare_foreign_keys(
    current: &Table,
    historical: &Table,
    short: &str,
    blueprint: &mut Blueprint,
    phases: &mut Phases,
) {
    let table = &current.name;
    let (added, removed) = unmatched(
        &current.foreign_keys,
        &historical.foreign_keys,
        ForeignKey::same_definition,
    );

    for key in removed {
        blueprint.describe(format!(
            "foreign key '{}' ({}) → {} removed",
            key.name,
            key.columns.join(", "),
            key.ref_table
        ));
        phases.drop_foreign_keys.push((
            Change::DropForeignKey {
                table: table.clone(),
                name: key.name.clone(),
            },
            Change::AddForeignKey {
                table: table.clone(),
                key: key.clone(),
            },
        ));
    }

    for key in added {
        let mut key = key.clone();
        if ForeignKey::needs_name(&key.name) {
            key.name = ForeignKey::synthesize_name(short, &key.columns);
        }
        blueprint.describe(format!(
            "foreign key '{}' ({}) → {} added",
            key.name,
            key.columns.join(", "),
            key.ref_table
        ));
        phases.add_foreign_keys.push((
            Change::AddForeignKey {
                table: table.clone(),
                key: key.clone(),
            },
            Change::DropForeignKey {
                table: table.clone(),
                name: key.name,
            },
        ));
    }
}

fn compare_indexes(current: &Table, historical: &Table, blueprint: &mut Blueprint, phases: &mut Phases) {
    let table = &current.name;
    let (added, removed) = unmatched(&current.indexes, &historical.indexes, |a, b| a.same_definition(b));

    for index in removed {
        blueprint.describe(format!(
            "index '{}' ({}) removed",
            index.name,
            index.columns.join(", ")
        ));
        phases.drop_indexes.push((
            Change::DropIndex {
                table: table.clone(),
                name: index.name.clone(),
            },
            Change::CreateIndex {
                table: table.clone(),
                index: index.clone(),
            },
        ));
    }

    for index in added {
        blueprint.describe(format!(
            "{}index '{}' ({}) added",
            if index.unique { "unique " } else { "" },
            index.name,
            index.columns.join(", ")
        ));
        phases.create_indexes.push((
            Change::CreateIndex {
                table: table.clone(),
                index: index.clone(),
            },
            Change::DropIndex {
                table: table.clone(),
                name: index.name.clone(),
            },
        ));
    }
}

/// Items of `current` with no counterpart in `historical`, and the reverse
///
/// Each historical item matches at most one current item.
fn unmatched<'a, T>(
    current: &'a [T],
    historical: &'a [T],
    same: impl Fn(&T, &T) -> bool,
) -> (Vec<&'a T>, Vec<&'a T>) {
    let mut used = vec![false; historical.len()];
    let mut added = Vec::new();

    for item in current {
        let found = historical
            .iter()
            .enumerate()
            .find(|&(i, other)| !used[i] && same(item, other));
        match found {
            Some((i, _)) => used[i] = true,
            None => added.push(item),
        }
    }

    let removed = historical
        .iter()
        .zip(used)
        .filter(|(_, used)| !used)
        .map(|(item, _)| item)
        .collect();
    (added, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftguard::schema::Index;

    fn post(dialect: Dialect) -> Table {
        let mut table = Table::new("post", dialect);
        table.columns = vec![
            Column::new("id", ColumnKind::Integer)
                .size(11)
                .not_null()
                .auto_increment()
                .in_primary_key(),
            Column::new("title", ColumnKind::String).size(255),
        ];
        table.primary_key = Some(PrimaryKey::new(["id"]));
        table
    }

    #[test]
    fn test_identical_tables_compare_empty() {
        let table = post(Dialect::Mysql);
        let blueprint = compare(&table, &table).unwrap();
        assert!(blueprint.is_empty());
        assert!(blueprint.differences().is_empty());
    }

    #[test]
    fn test_shorthand_history_matches_introspected_key() {
        let current = post(Dialect::Mysql);
        let mut historical = post(Dialect::Mysql);
        historical.columns[0] = Column::new("id", ColumnKind::PrimaryKey).in_primary_key();
        historical.columns[1] = Column::new("title", ColumnKind::String);

        assert!(compare(&current, &historical).unwrap().is_empty());
    }

    #[test]
    fn test_added_column_carries_position() {
        let historical = post(Dialect::Mysql);
        let mut current = post(Dialect::Mysql);
        current.columns.insert(1, Column::new("slug", ColumnKind::String).size(64));

        let blueprint = compare(&current, &historical).unwrap();
        match &blueprint.up()[0] {
            Change::AddColumn { column, .. } => {
                assert_eq!(column.name, "slug");
                assert_eq!(column.after.as_deref(), Some("id"));
            }
            other => panic!("unexpected change {:?}", other),
        }
        assert_eq!(
            blueprint.down(),
            vec![&Change::DropColumn {
                table: "post".to_string(),
                column: "slug".to_string(),
            }]
        );
    }

    #[test]
    fn test_comment_only_difference() {
        let historical = post(Dialect::Pgsql);
        let mut current = post(Dialect::Pgsql);
        current.columns[1].comment = Some("Headline".to_string());

        let blueprint = compare(&current, &historical).unwrap();
        assert_eq!(
            blueprint.up(),
            &[Change::AddComment {
                table: "post".to_string(),
                column: "title".to_string(),
                comment: "Headline".to_string(),
            }]
        );

        // sqlite never reports comments
        let historical = post(Dialect::Sqlite);
        let mut current = post(Dialect::Sqlite);
        current.columns[1].comment = Some("Headline".to_string());
        assert!(compare(&current, &historical).unwrap().is_empty());
    }

    #[test]
    fn test_emission_order() {
        let mut historical = post(Dialect::Mysql);
        historical.columns.push(Column::new("legacy", ColumnKind::Text));
        historical.indexes.push(Index::new("idx-post-legacy", ["legacy"]));

        let mut current = post(Dialect::Mysql);
        current.columns[1].not_null = true;
        current.columns.push(Column::new("slug", ColumnKind::String));
        current.indexes.push(Index::new("idx-post-slug", ["slug"]).unique());

        let kinds: Vec<_> = compare(&current, &historical)
            .unwrap()
            .up()
            .iter()
            .map(Change::kind)
            .collect();
        use driftguard::schema::OperationKind::*;
        assert_eq!(kinds, vec![DropIndex, DropColumn, AlterColumn, AddColumn, CreateIndex]);
    }

    #[test]
    fn test_foreign_keys_match_by_definition() {
        let mut historical = post(Dialect::Mysql);
        historical.columns.push(Column::new("author_id", ColumnKind::Integer));
        historical
            .foreign_keys
            .push(ForeignKey::new("fk-post-author_id", ["author_id"], "user", ["id"]));

        let mut current = historical.clone();
        current.foreign_keys[0].name = "post_ibfk_1".to_string();
        assert!(compare(&current, &historical).unwrap().is_empty());
    }

    #[test]
    fn test_adjacent_drops_restore_in_order() {
        let mut historical = post(Dialect::Mysql);
        for name in ["a", "b", "c"] {
            historical.columns.push(Column::new(name, ColumnKind::Text));
        }
        let current = post(Dialect::Mysql);

        let blueprint = compare(&current, &historical).unwrap();
        let restored: Vec<(&str, Option<&str>)> = blueprint
            .down()
            .into_iter()
            .filter_map(|change| match change {
                Change::AddColumn { column, .. } => Some((column.name.as_str(), column.after.as_deref())),
                _ => None,
            })
            .collect();
        assert_eq!(
            restored,
            vec![("a", Some("title")), ("b", Some("a")), ("c", Some("b"))]
        );
    }

    #[test]
    fn test_alter_keeps_comment_dialect_cannot_report() {
        let mut historical = post(Dialect::Mssql);
        historical.columns[1].comment = Some("Headline".to_string());
        let mut current = post(Dialect::Mssql);
        current.columns[1] = current.columns[1].clone().not_null();

        let blueprint = compare(&current, &historical).unwrap();
        match blueprint.up() {
            [Change::AlterColumn { column, .. }] => {
                assert!(column.not_null);
                assert_eq!(column.comment.as_deref(), Some("Headline"));
            }
            other => panic!("unexpected changes {:?}", other),
        }

        // mysql reports comments, so a missing one is a real removal
        let mut historical = post(Dialect::Mysql);
        historical.columns[1].comment = Some("Headline".to_string());
        let mut current = post(Dialect::Mysql);
        current.columns[1] = current.columns[1].clone().not_null();
        let blueprint = compare(&current, &historical).unwrap();
        match &blueprint.up()[0] {
            Change::AlterColumn { column, .. } => assert_eq!(column.comment, None),
            other => panic!("unexpected change {:?}", other),
        }
    }
}

//! SQL schema for the skein SQLite store.
//!
//! Tables are declared as plain data and rendered to DDL by one generic
//! routine. [`TABLES`] is in dependency order; [`DROP_ORDER`] is its reverse
//! with respect to foreign keys, so a drop never trips a constraint.

use std::fmt::Write as _;

/// Pragmas applied to every connection before any other statement.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum SqlType {
  #[strum(serialize = "TEXT")]
  Text,
  /// RFC 3339 string.
  #[strum(serialize = "TEXT")]
  Timestamp,
}

#[derive(Debug, Clone, Copy)]
pub struct Column {
  pub name:     &'static str,
  pub ty:       SqlType,
  pub nullable: bool,
  pub unique:   bool,
}

impl Column {
  pub const fn text(name: &'static str) -> Self {
    Self {
      name,
      ty: SqlType::Text,
      nullable: false,
      unique: false,
    }
  }

  pub const fn timestamp(name: &'static str) -> Self {
    Self {
      ty: SqlType::Timestamp,
      ..Self::text(name)
    }
  }

  pub const fn nullable(self) -> Self {
    Self {
      nullable: true,
      ..self
    }
  }

  pub const fn unique(self) -> Self { Self { unique: true, ..self } }
}

#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
  pub columns:    &'static [&'static str],
  pub table:      &'static str,
  pub references: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct Index {
  pub name:    &'static str,
  pub columns: &'static [&'static str],
}

#[derive(Debug, Clone, Copy)]
pub struct Table {
  pub name:         &'static str,
  pub columns:      &'static [Column],
  pub primary_key:  &'static [&'static str],
  pub unique:       &'static [&'static [&'static str]],
  pub foreign_keys: &'static [ForeignKey],
  pub checks:       &'static [&'static str],
  pub indexes:      &'static [Index],
}

impl Table {
  pub fn column(&self, name: &str) -> Option<&Column> {
    self.columns.iter().find(|c| c.name == name)
  }

  /// `CREATE TABLE` statement for this table.
  pub fn create_sql(&self) -> String {
    let mut lines: Vec<String> = self
      .columns
      .iter()
      .map(|c| {
        let mut line = format!("{} {}", c.name, c.ty);
        if !c.nullable {
          line.push_str(" NOT NULL");
        }
        if c.unique {
          line.push_str(" UNIQUE");
        }
        line
      })
      .collect();

    lines.push(format!("PRIMARY KEY ({})", self.primary_key.join(", ")));
    for cols in self.unique {
      lines.push(format!("UNIQUE ({})", cols.join(", ")));
    }
    for fk in self.foreign_keys {
      lines.push(format!(
        "FOREIGN KEY ({}) REFERENCES {} ({})",
        fk.columns.join(", "),
        fk.table,
        fk.references.join(", ")
      ));
    }
    for check in self.checks {
      lines.push(format!("CHECK ({check})"));
    }

    format!("CREATE TABLE {} (\n    {}\n)", self.name, lines.join(",\n    "))
  }

  /// `CREATE INDEX` statements for this table's secondary indexes.
  pub fn index_sql(&self) -> Vec<String> {
    self
      .indexes
      .iter()
      .map(|idx| {
        format!(
          "CREATE INDEX {} ON {} ({})",
          idx.name,
          self.name,
          idx.columns.join(", ")
        )
      })
      .collect()
  }
}

/// DDL for every table and index, in creation order.
pub fn create_all_sql() -> String {
  let mut sql = String::new();
  for table in TABLES {
    let _ = writeln!(sql, "{};", table.create_sql());
    for index in table.index_sql() {
      let _ = writeln!(sql, "{index};");
    }
  }
  sql
}

/// `DROP TABLE IF EXISTS` for an arbitrary table name.
pub fn drop_sql(name: &str) -> String {
  format!("DROP TABLE IF EXISTS \"{}\"", name.replace('"', "\"\""))
}

// ─── Tables ──────────────────────────────────────────────────────────────────

pub const REPO_ROOTS: Table = Table {
  name:         "repo_roots",
  columns:      &[Column::text("did"), Column::text("root")],
  primary_key:  &["did"],
  unique:       &[],
  foreign_keys: &[],
  checks:       &[],
  indexes:      &[],
};

pub const USER_DIDS: Table = Table {
  name:         "user_dids",
  columns:      &[Column::text("did"), Column::text("username").unique()],
  primary_key:  &["did"],
  unique:       &[],
  foreign_keys: &[],
  checks:       &[],
  indexes:      &[],
};

pub const POSTS: Table = Table {
  name:         "posts",
  columns:      &[
    Column::text("uri"),
    Column::text("creator"),
    Column::text("tid"),
    Column::text("program"),
    Column::text("text"),
    Column::text("reply_root").nullable(),
    Column::text("reply_parent").nullable(),
    Column::timestamp("created_at"),
    // UTC at fixed precision; byte order is chronological order.
    Column::timestamp("created_at_utc"),
    Column::timestamp("indexed_at"),
  ],
  primary_key:  &["uri"],
  // Identity tuple referenced by likes.
  unique:       &[&["tid", "creator", "program"]],
  foreign_keys: &[ForeignKey {
    columns:    &["creator"],
    table:      "user_dids",
    references: &["did"],
  }],
  checks:       &["(reply_root IS NULL) = (reply_parent IS NULL)"],
  indexes:      &[
    Index {
      name:    "posts_creator_idx",
      columns: &["creator", "created_at_utc"],
    },
    Index {
      name:    "posts_reply_root_idx",
      columns: &["reply_root", "created_at_utc"],
    },
  ],
};

pub const LIKES: Table = Table {
  name:         "likes",
  columns:      &[
    Column::text("tid"),
    Column::text("author"),
    Column::text("program"),
    Column::text("post_tid"),
    Column::text("post_author"),
    Column::text("post_program"),
    Column::text("post_cid").nullable(),
    Column::timestamp("created_at"),
    Column::timestamp("indexed_at"),
  ],
  primary_key:  &["tid", "author", "program"],
  unique:       &[],
  foreign_keys: &[
    ForeignKey {
      columns:    &["author"],
      table:      "user_dids",
      references: &["did"],
    },
    ForeignKey {
      columns:    &["post_tid", "post_author", "post_program"],
      table:      "posts",
      references: &["tid", "creator", "program"],
    },
  ],
  checks:       &[],
  indexes:      &[Index {
    name:    "likes_post_idx",
    columns: &["post_tid", "post_author", "post_program"],
  }],
};

pub const FOLLOWS: Table = Table {
  name:         "follows",
  columns:      &[
    Column::text("creator"),
    Column::text("target"),
    Column::text("uri").unique(),
    Column::timestamp("created_at"),
    Column::timestamp("indexed_at"),
  ],
  primary_key:  &["creator", "target"],
  unique:       &[],
  foreign_keys: &[
    ForeignKey {
      columns:    &["creator"],
      table:      "user_dids",
      references: &["did"],
    },
    ForeignKey {
      columns:    &["target"],
      table:      "user_dids",
      references: &["did"],
    },
  ],
  checks:       &[],
  indexes:      &[Index {
    name:    "follows_target_idx",
    columns: &["target"],
  }],
};

/// Every table, in creation order.
pub const TABLES: &[Table] = &[REPO_ROOTS, USER_DIDS, POSTS, LIKES, FOLLOWS];

/// Table names in the order they must be dropped.
pub const DROP_ORDER: &[&str] =
  &["follows", "likes", "posts", "repo_roots", "user_dids"];

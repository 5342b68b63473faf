use super::rules::FieldRule;

/// Who may see and change the records of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Every record belongs to the user who created it.
    Owned,
    /// Shared reference data, open to any authenticated caller.
    Catalog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn sql(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Whether a failed write is reported as the client's fault (400) or the
/// server's (500).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Client,
    Server,
}

/// Static description of one resource: storage, access kind and rules.
///
/// Rule names double as column names.
#[derive(Debug)]
pub struct Table {
    pub name: &'static str,
    pub label: &'static str,
    pub access: Access,
    pub rules: &'static [FieldRule],
    /// Column used for date windows (history, `date_from`).
    pub date_field: Option<&'static str>,
    pub order: &'static [(&'static str, Direction)],
    /// Window applied to the plain list when no `date_from` is given.
    pub list_window_days: Option<i64>,
    pub create_failure: FailureClass,
}

impl Table {
    pub fn is_owned(&self) -> bool {
        self.access == Access::Owned
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|r| r.name)
    }
}

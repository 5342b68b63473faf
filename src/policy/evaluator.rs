use uuid::Uuid;

use super::{Access, FailureClass, PolicyError, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn verb(self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::Retrieve => "retrieve",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }

    pub fn gerund(self) -> &'static str {
        match self {
            Operation::List | Operation::Retrieve => "loading",
            Operation::Create => "saving",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
        }
    }
}

/// Decide whether `caller` may run `op` on a record owned by `owner`.
///
/// List and create never fail here: lists are scoped by the store filter and
/// create stamps the caller as owner. A record the caller does not own is
/// invisible on retrieve and forbidden on update/delete.
pub fn authorize(
    table: &Table,
    op: Operation,
    caller: Uuid,
    owner: Option<Uuid>,
) -> Result<(), PolicyError> {
    if table.access == Access::Catalog {
        return Ok(());
    }
    match op {
        Operation::List | Operation::Create => Ok(()),
        _ if owner == Some(caller) => Ok(()),
        Operation::Retrieve => Err(PolicyError::NotFound(table.label)),
        Operation::Update | Operation::Delete => Err(PolicyError::Forbidden {
            label: table.label,
            op,
        }),
    }
}

/// How a store failure during `op` is reported. Reads are always server
/// faults; writes are client faults unless the table says otherwise for
/// create.
pub fn persistence_fault(table: &Table, op: Operation) -> FailureClass {
    match op {
        Operation::List | Operation::Retrieve => FailureClass::Server,
        Operation::Create => table.create_failure,
        Operation::Update | Operation::Delete => FailureClass::Client,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goals::model::Goal;
    use crate::nutrition::model::Food;
    use crate::resources::Resource;
    use crate::workouts::model::Workout;

    #[test]
    fn owner_may_do_everything() {
        let me = Uuid::new_v4();
        for op in [
            Operation::List,
            Operation::Retrieve,
            Operation::Create,
            Operation::Update,
            Operation::Delete,
        ] {
            assert!(authorize(Goal::TABLE, op, me, Some(me)).is_ok(), "{op:?}");
        }
    }

    #[test]
    fn stranger_gets_not_found_on_read_and_forbidden_on_write() {
        let (me, other) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(matches!(
            authorize(Goal::TABLE, Operation::Retrieve, me, Some(other)),
            Err(PolicyError::NotFound("goal"))
        ));
        for op in [Operation::Update, Operation::Delete] {
            let err = authorize(Goal::TABLE, op, me, Some(other)).unwrap_err();
            assert!(matches!(err, PolicyError::Forbidden { .. }));
            assert_eq!(err.to_string(), format!("Not authorized to {} this goal", op.verb()));
        }
    }

    #[test]
    fn catalog_is_open_to_any_caller() {
        let me = Uuid::new_v4();
        for op in [Operation::Retrieve, Operation::Update, Operation::Delete] {
            assert!(authorize(Food::TABLE, op, me, None).is_ok());
        }
    }

    #[test]
    fn workout_create_failures_are_server_faults() {
        assert_eq!(
            persistence_fault(Workout::TABLE, Operation::Create),
            FailureClass::Server
        );
        assert_eq!(
            persistence_fault(Workout::TABLE, Operation::Update),
            FailureClass::Client
        );
        assert_eq!(
            persistence_fault(Goal::TABLE, Operation::Create),
            FailureClass::Client
        );
        assert_eq!(
            persistence_fault(Goal::TABLE, Operation::List),
            FailureClass::Server
        );
    }
}

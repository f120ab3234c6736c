use resq_data::DataError;
use sqlx::error::BoxDynError;

/// `sqlx::Error` → `DataError`, since `From` cannot be implemented across
/// the two foreign types here.
pub trait SqlxErrorExt {
    fn into_data_error(self) -> DataError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_data_error(self) -> DataError {
        match self {
            sqlx::Error::RowNotFound => DataError::NotFound("no matching row".into()),
            // A rule pointing at a column the row type does not carry.
            sqlx::Error::ColumnNotFound(column) => {
                DataError::Other(format!("column `{column}` missing from result row"))
            }
            other => DataError::database(other),
        }
    }
}

/// Wraps a failure to encode a filter value as a bind parameter.
pub(crate) fn bind_error(position: usize, err: BoxDynError) -> DataError {
    DataError::Other(format!("cannot bind parameter {}: {err}", position + 1))
}

pub type SqlxResult<T> = Result<T, DataError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            sqlx::Error::RowNotFound.into_data_error(),
            DataError::NotFound(_)
        ));
    }

    #[test]
    fn missing_column_names_the_column() {
        let err = sqlx::Error::ColumnNotFound("email".into()).into_data_error();
        assert_eq!(
            err.to_string(),
            "Data error: column `email` missing from result row"
        );
    }

    #[test]
    fn bind_errors_are_one_based() {
        let err = bind_error(0, "unsupported".into());
        assert_eq!(err.to_string(), "Data error: cannot bind parameter 1: unsupported");
    }
}

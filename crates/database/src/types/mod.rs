pub mod errors;

pub type StoreResult<T> = Result<T, errors::StoreError>;

pub use accounts::{Account, AccountKind};
pub use budgets::{Budget, BudgetPeriod, BudgetStatus};
pub use currency::Currency;
pub use error::EngineError;
pub use ops::{
    BudgetChanges, Engine, EngineBuilder, MonthlySummary, TransactionChanges,
    TransactionListFilter,
};
pub use refresh::{BudgetSession, DEFAULT_REFRESH_INTERVAL, RefreshHandle};
pub use transactions::{Transaction, TransactionKind};

mod accounts;
mod budgets;
mod currency;
mod error;
mod ops;
mod refresh;
mod transactions;
mod users;

type ResultEngine<T> = Result<T, EngineError>;

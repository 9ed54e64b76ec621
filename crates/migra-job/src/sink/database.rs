//! Database batch writers
//!
//! Each writer executes one multi-row parameterized INSERT per batch: a
//! single network round trip, atomic as one statement. Column mapping is
//! fixed per entity type. With 5 binds per row, a full 10,000-record chunk
//! stays well under Postgres's 65,535 bind-parameter limit.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::debug;

use super::BatchSink;
use crate::error::Result;
use crate::models::{BankAccount, Person};

/// Inserts person batches into the `person` table.
pub struct PersonDbSink {
    pool: PgPool,
}

impl PersonDbSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn person_insert(batch: &[Person]) -> QueryBuilder<'_, Postgres> {
    let mut query_builder =
        QueryBuilder::new("INSERT INTO person (id, name, email, birth_date, age) ");

    query_builder.push_values(batch, |mut b, person| {
        b.push_bind(person.id)
            .push_bind(&person.name)
            .push_bind(&person.email)
            .push_bind(person.birth_date)
            .push_bind(person.age);
    });

    query_builder
}

#[async_trait]
impl BatchSink<Person> for PersonDbSink {
    async fn write(&mut self, batch: &[Person]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut query_builder = person_insert(batch);
        query_builder.build().execute(&self.pool).await?;

        debug!(rows = batch.len(), table = "person", "inserted batch");
        Ok(())
    }
}

/// Inserts bank-account batches into the `dados_bancarios` table.
pub struct BankAccountDbSink {
    pool: PgPool,
}

impl BankAccountDbSink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn bank_account_insert(batch: &[BankAccount]) -> QueryBuilder<'_, Postgres> {
    let mut query_builder =
        QueryBuilder::new("INSERT INTO dados_bancarios (id, pessoa_id, agencia, conta, banco) ");

    query_builder.push_values(batch, |mut b, account| {
        b.push_bind(account.id)
            .push_bind(account.person_id)
            .push_bind(account.branch)
            .push_bind(account.account)
            .push_bind(account.bank);
    });

    query_builder
}

#[async_trait]
impl BatchSink<BankAccount> for BankAccountDbSink {
    async fn write(&mut self, batch: &[BankAccount]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut query_builder = bank_account_insert(batch);
        query_builder.build().execute(&self.pool).await?;

        debug!(
            rows = batch.len(),
            table = "dados_bancarios",
            "inserted batch"
        );
        Ok(())
    }
}

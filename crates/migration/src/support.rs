use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ColumnTrait, EntityTrait, Schema};

/// Create the table described by `entity` plus the indexes declared on its
/// columns.
pub(crate) async fn create_entity_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let schema = Schema::new(manager.get_database_backend());
    let mut table = schema.create_table_from_entity(entity);
    manager.create_table(table.if_not_exists().to_owned()).await?;
    for mut index in schema.create_index_from_entity(entity) {
        manager.create_index(index.if_not_exists().to_owned()).await?;
    }
    Ok(())
}

pub(crate) async fn unique_index<E, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    entity: E,
    columns: impl IntoIterator<Item = C>,
) -> Result<(), DbErr>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let mut index = Index::create();
    index.if_not_exists().name(name).table(entity).unique();
    for column in columns {
        index.col(column);
    }
    manager.create_index(index.to_owned()).await
}

pub(crate) async fn index<E, C>(
    manager: &SchemaManager<'_>,
    name: &str,
    entity: E,
    columns: impl IntoIterator<Item = C>,
) -> Result<(), DbErr>
where
    E: EntityTrait,
    C: ColumnTrait,
{
    let mut index = Index::create();
    index.if_not_exists().name(name).table(entity);
    for column in columns {
        index.col(column);
    }
    manager.create_index(index.to_owned()).await
}

pub(crate) async fn drop_entity_table<E>(manager: &SchemaManager<'_>, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    manager
        .drop_table(Table::drop().table(entity).if_exists().to_owned())
        .await
}

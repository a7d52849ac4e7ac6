use crate::entities::consumption;
use crate::entities::prelude::*;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // The log list and every analytics window filter by user then date.
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_consumption_user_date")
                    .table(Consumption)
                    .col(consumption::Column::UserId)
                    .col(consumption::Column::Date)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_consumption_food")
                    .table(Consumption)
                    .col(consumption::Column::FoodId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_consumption_food")
                    .table(Consumption)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_consumption_user_date")
                    .table(Consumption)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Categories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Categories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Categories::Name).string().not_null())
                    .col(ColumnDef::new(Categories::SequenceNo).integer().not_null())
                    .to_owned(),
            )
            .await?;

        // Not unique: reordering rewrites sequence numbers one row at a
        // time and duplicates them transiently inside the transaction.
        manager
            .create_index(
                Index::create()
                    .name("idx-categories-sequence_no")
                    .table(Categories::Table)
                    .col(Categories::SequenceNo)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SubCategories::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SubCategories::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SubCategories::CatId).integer().not_null())
                    .col(ColumnDef::new(SubCategories::Name).string().not_null())
                    .col(
                        ColumnDef::new(SubCategories::SequenceNo)
                            .integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sub_categories-cat_id")
                            .from(SubCategories::Table, SubCategories::CatId)
                            .to(Categories::Table, Categories::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sub_categories-cat_id-sequence_no")
                    .table(SubCategories::Table)
                    .col(SubCategories::CatId)
                    .col(SubCategories::SequenceNo)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SubCategories::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categories::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub enum Categories {
    Table,
    Id,
    Name,
    SequenceNo,
}

#[derive(Iden)]
pub enum SubCategories {
    Table,
    Id,
    CatId,
    Name,
    SequenceNo,
}

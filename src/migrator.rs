use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240115_000001_create_users_table::Migration),
            Box::new(m20240115_000002_create_restaurants_table::Migration),
            Box::new(m20240115_000003_create_menu_items_table::Migration),
            Box::new(m20240115_000004_create_orders_table::Migration),
            Box::new(m20240115_000005_create_order_items_table::Migration),
            Box::new(m20240115_000006_create_reviews_table::Migration),
            Box::new(m20240115_000007_create_favorites_table::Migration),
        ]
    }
}

mod m20240115_000001_create_users_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000001_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Phone).string().null())
                        .col(ColumnDef::new(Users::Address).string().null())
                        .col(
                            ColumnDef::new(Users::Role)
                                .string_len(20)
                                .not_null()
                                .default("customer"),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        Phone,
        Address,
        Role,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240115_000002_create_restaurants_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000002_create_restaurants_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Restaurants::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Restaurants::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Restaurants::OwnerId).uuid().not_null())
                        .col(ColumnDef::new(Restaurants::Name).string().not_null())
                        .col(ColumnDef::new(Restaurants::Description).text().null())
                        .col(ColumnDef::new(Restaurants::Cuisine).string().not_null())
                        .col(ColumnDef::new(Restaurants::Address).string().not_null())
                        .col(ColumnDef::new(Restaurants::Phone).string().null())
                        .col(ColumnDef::new(Restaurants::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Restaurants::Rating)
                                .decimal_len(3, 2)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Restaurants::ReviewCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Restaurants::DeliveryFee)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Restaurants::MinimumOrder)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Restaurants::DeliveryTimeMinutes)
                                .integer()
                                .not_null()
                                .default(45),
                        )
                        .col(
                            ColumnDef::new(Restaurants::IsOpen)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Restaurants::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Restaurants::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_restaurants_owner_id")
                        .table(Restaurants::Table)
                        .col(Restaurants::OwnerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_restaurants_cuisine")
                        .table(Restaurants::Table)
                        .col(Restaurants::Cuisine)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Restaurants::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Restaurants {
        Table,
        Id,
        OwnerId,
        Name,
        Description,
        Cuisine,
        Address,
        Phone,
        ImageUrl,
        Rating,
        ReviewCount,
        DeliveryFee,
        MinimumOrder,
        DeliveryTimeMinutes,
        IsOpen,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240115_000003_create_menu_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000003_create_menu_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(MenuItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(MenuItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::RestaurantId).uuid().not_null())
                        .col(ColumnDef::new(MenuItems::Name).string().not_null())
                        .col(ColumnDef::new(MenuItems::Description).text().null())
                        .col(
                            ColumnDef::new(MenuItems::Price)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(MenuItems::Category).string().null())
                        .col(ColumnDef::new(MenuItems::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(MenuItems::IsAvailable)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(MenuItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(MenuItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_menu_items_restaurant_id")
                        .table(MenuItems::Table)
                        .col(MenuItems::RestaurantId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(MenuItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum MenuItems {
        Table,
        Id,
        RestaurantId,
        Name,
        Description,
        Price,
        Category,
        ImageUrl,
        IsAvailable,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240115_000004_create_orders_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000004_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::TrackingId).string().not_null())
                        .col(ColumnDef::new(Orders::UserId).uuid().not_null())
                        .col(ColumnDef::new(Orders::RestaurantId).uuid().not_null())
                        .col(
                            ColumnDef::new(Orders::Status)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentStatus)
                                .string_len(20)
                                .not_null()
                                .default("pending"),
                        )
                        .col(
                            ColumnDef::new(Orders::PaymentMethod)
                                .string_len(10)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::DeliveryStreet).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryCity).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryState).string().not_null())
                        .col(ColumnDef::new(Orders::DeliveryZip).string().not_null())
                        .col(
                            ColumnDef::new(Orders::Subtotal)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::DeliveryFee)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Tax)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::Total)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::EstimatedDeliveryTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::ActualDeliveryTime)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(Orders::DriverId).uuid().null())
                        .col(
                            ColumnDef::new(Orders::Version)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_tracking_id")
                        .table(Orders::Table)
                        .col(Orders::TrackingId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_restaurant_id")
                        .table(Orders::Table)
                        .col(Orders::RestaurantId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        TrackingId,
        UserId,
        RestaurantId,
        Status,
        PaymentStatus,
        PaymentMethod,
        DeliveryStreet,
        DeliveryCity,
        DeliveryState,
        DeliveryZip,
        Subtotal,
        DeliveryFee,
        Tax,
        Total,
        EstimatedDeliveryTime,
        ActualDeliveryTime,
        DriverId,
        Version,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240115_000005_create_order_items_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000005_create_order_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::MenuItemId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::Name).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::Price)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        MenuItemId,
        Name,
        Price,
        Quantity,
    }
}

mod m20240115_000006_create_reviews_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000006_create_reviews_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::UserId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::RestaurantId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::Rating).small_integer().not_null())
                        .col(ColumnDef::new(Reviews::Comment).text().null())
                        .col(
                            ColumnDef::new(Reviews::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_restaurant_id")
                        .table(Reviews::Table)
                        .col(Reviews::RestaurantId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Reviews {
        Table,
        Id,
        UserId,
        RestaurantId,
        Rating,
        Comment,
        CreatedAt,
    }
}

mod m20240115_000007_create_favorites_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240115_000007_create_favorites_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Favorites::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Favorites::UserId).uuid().not_null())
                        .col(ColumnDef::new(Favorites::RestaurantId).uuid().not_null())
                        .col(
                            ColumnDef::new(Favorites::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(Favorites::UserId)
                                .col(Favorites::RestaurantId),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Favorites::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Favorites {
        Table,
        UserId,
        RestaurantId,
        CreatedAt,
    }
}

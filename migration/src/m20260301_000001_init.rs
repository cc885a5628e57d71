use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ========== LOCATIONS ==========
        manager
            .create_table(
                Table::create()
                    .table(Locations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Locations::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Locations::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Locations::Description).text())
                    .col(
                        ColumnDef::new(Locations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT NOW()"),
                    )
                    .to_owned(),
            )
            .await?;

        // Case-insensitive unique index on location name
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX locations_name_lower_idx ON locations (LOWER(name))",
            )
            .await?;

        // ========== DEVICES ==========
        // Sensors and actuators share one table, discriminated by `kind`
        manager
            .create_table(
                Table::create()
                    .table(Devices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Devices::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Devices::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Devices::Name).string_len(128).not_null())
                    .col(ColumnDef::new(Devices::LocationId).uuid())
                    .col(
                        ColumnDef::new(Devices::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Devices::MeasurementType).string_len(64))
                    .col(ColumnDef::new(Devices::Unit).string_len(32))
                    .col(ColumnDef::new(Devices::EndpointUrl).string_len(512))
                    .col(ColumnDef::new(Devices::ActuatorType).string_len(64))
                    .col(ColumnDef::new(Devices::IsOn).boolean())
                    .col(
                        ColumnDef::new(Devices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(
                        ColumnDef::new(Devices::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_devices_location")
                            .from(Devices::Table, Devices::LocationId)
                            .to(Locations::Table, Locations::Id),
                    )
                    .to_owned(),
            )
            .await?;

        let db = manager.get_connection();

        db.execute_unprepared(
            "ALTER TABLE devices ADD CONSTRAINT devices_kind_check CHECK (kind IN ('sensor', 'actuator'))",
        )
        .await?;

        db.execute_unprepared("CREATE INDEX idx_devices_kind_active ON devices (kind, is_active)")
            .await?;

        // ========== THRESHOLDS ==========
        manager
            .create_table(
                Table::create()
                    .table(Thresholds::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Thresholds::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Thresholds::SensorId).uuid().not_null())
                    .col(ColumnDef::new(Thresholds::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Thresholds::Severity).string_len(16).not_null())
                    .col(ColumnDef::new(Thresholds::Value).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(Thresholds::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Thresholds::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT NOW()"),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_thresholds_sensor")
                            .from(Thresholds::Table, Thresholds::SensorId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // No uniqueness on (sensor, kind, severity): several thresholds may coexist
        db.execute_unprepared(
            "CREATE INDEX idx_thresholds_sensor_active ON thresholds (sensor_id) WHERE is_active",
        )
        .await?;

        // ========== READINGS ==========
        manager
            .create_table(
                Table::create()
                    .table(Readings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Readings::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Readings::SensorId).uuid().not_null())
                    .col(ColumnDef::new(Readings::Value).decimal_len(10, 2).not_null())
                    .col(
                        ColumnDef::new(Readings::Time)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Readings::Origin).string_len(16).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_readings_sensor")
                            .from(Readings::Table, Readings::SensorId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        db.execute_unprepared("CREATE INDEX idx_readings_sensor_time ON readings (sensor_id, time DESC)")
            .await?;

        // ========== ALERTS ==========
        // No reference to the triggering reading
        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alerts::Id)
                            .uuid()
                            .not_null()
                            .primary_key()
                            .extra("DEFAULT gen_random_uuid()"),
                    )
                    .col(ColumnDef::new(Alerts::SensorId).uuid().not_null())
                    .col(ColumnDef::new(Alerts::ThresholdId).uuid().not_null())
                    .col(ColumnDef::new(Alerts::Kind).string_len(16).not_null())
                    .col(ColumnDef::new(Alerts::Severity).string_len(16).not_null())
                    .col(
                        ColumnDef::new(Alerts::Status)
                            .string_len(16)
                            .not_null()
                            .default("active"),
                    )
                    .col(ColumnDef::new(Alerts::Message).text())
                    .col(
                        ColumnDef::new(Alerts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .extra("DEFAULT NOW()"),
                    )
                    .col(ColumnDef::new(Alerts::AcknowledgedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Alerts::ResolvedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_sensor")
                            .from(Alerts::Table, Alerts::SensorId)
                            .to(Devices::Table, Devices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // NO ACTION is checked at statement end, so deleting a
                    // device still cascades through thresholds and alerts
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_alerts_threshold")
                            .from(Alerts::Table, Alerts::ThresholdId)
                            .to(Thresholds::Table, Thresholds::Id)
                            .on_delete(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one open alert per (sensor, threshold, severity)
        db.execute_unprepared(
            "CREATE UNIQUE INDEX alerts_open_unique_idx ON alerts (sensor_id, threshold_id, severity) WHERE status <> 'resolved'",
        )
        .await?;

        // Dashboard and per-sensor listings
        db.execute_unprepared(
            "CREATE INDEX idx_alerts_status_created ON alerts (status, created_at DESC)",
        )
        .await?;
        db.execute_unprepared(
            "CREATE INDEX idx_alerts_sensor_created ON alerts (sensor_id, created_at DESC)",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order of dependencies
        manager
            .drop_table(Table::drop().table(Alerts::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Readings::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Thresholds::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Devices::Table).if_exists().to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Locations::Table).if_exists().to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Locations {
    Table,
    Id,
    Name,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Devices {
    Table,
    Id,
    Kind,
    Name,
    LocationId,
    IsActive,
    MeasurementType,
    Unit,
    EndpointUrl,
    ActuatorType,
    IsOn,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Thresholds {
    Table,
    Id,
    SensorId,
    Kind,
    Severity,
    Value,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Readings {
    Table,
    Id,
    SensorId,
    Value,
    Time,
    Origin,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    SensorId,
    ThresholdId,
    Kind,
    Severity,
    Status,
    Message,
    CreatedAt,
    AcknowledgedAt,
    ResolvedAt,
}

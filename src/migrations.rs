/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

//! Migration catalogue
//!
//! Every schema change the admin endpoints can apply, grouped by logical
//! database. Units run in order; a unit may depend on an earlier one (an
//! index on a column added above it) but never on another set.

use crate::migrate::{Guard, Unit};

pub struct MigrationSet {
    pub name: &'static str,
    pub database: &'static str,
    pub units: &'static [Unit],
}

pub fn find(name: &str) -> Option<&'static MigrationSet> {
    SETS.iter().find(|set| set.name == name)
}

pub static SETS: &[MigrationSet] = &[
    MigrationSet {
        name: "users",
        database: "users",
        units: &[
            Unit {
                name: "create_users",
                guard: Guard::TableAbsent("users"),
                ddl: "create table users (
                    id integer primary key autoincrement,
                    email text not null unique,
                    password_hash text not null,
                    first_name text,
                    last_name text,
                    tier text not null default 'standard',
                    status text not null default 'active',
                    email_verified integer default 0,
                    last_login datetime,
                    created_at datetime not null default current_timestamp,
                    updated_at datetime not null default current_timestamp
                )",
            },
            Unit {
                name: "create_sessions",
                guard: Guard::TableAbsent("sessions"),
                ddl: "create table sessions (
                    id integer primary key autoincrement,
                    user_id integer not null,
                    session_token text not null unique,
                    ip_address text,
                    user_agent text,
                    expires_at datetime not null,
                    created_at datetime not null default current_timestamp
                )",
            },
            // VIP support arrived after the first deployments, so these are
            // alters rather than part of create_users.
            Unit {
                name: "add_users_vip_approved",
                guard: Guard::ColumnAbsent {
                    table: "users",
                    column: "vip_approved",
                },
                ddl: "alter table users add column vip_approved integer default 0",
            },
            Unit {
                name: "add_users_vip_server_id",
                guard: Guard::ColumnAbsent {
                    table: "users",
                    column: "vip_server_id",
                },
                ddl: "alter table users add column vip_server_id integer",
            },
            Unit {
                name: "idx_users_email",
                guard: Guard::IndexAbsent("idx_users_email"),
                ddl: "create index idx_users_email on users(email)",
            },
            Unit {
                name: "idx_users_status",
                guard: Guard::IndexAbsent("idx_users_status"),
                ddl: "create index idx_users_status on users(status)",
            },
            Unit {
                name: "idx_sessions_token",
                guard: Guard::IndexAbsent("idx_sessions_token"),
                ddl: "create index idx_sessions_token on sessions(session_token)",
            },
        ],
    },
    MigrationSet {
        name: "logs",
        database: "logs",
        units: &[
            Unit {
                name: "create_webhook_log",
                guard: Guard::TableAbsent("webhook_log"),
                ddl: "create table webhook_log (
                    id integer primary key autoincrement,
                    source text,
                    event_type text,
                    payload text,
                    processed integer default 0,
                    processed_at datetime,
                    error text,
                    received_at datetime default current_timestamp
                )",
            },
            Unit {
                name: "idx_webhook_log_event",
                guard: Guard::IndexAbsent("idx_webhook_log_event"),
                ddl: "create index idx_webhook_log_event on webhook_log(event_type)",
            },
        ],
    },
    MigrationSet {
        name: "billing",
        database: "billing",
        units: &[
            Unit {
                name: "create_subscriptions",
                guard: Guard::TableAbsent("subscriptions"),
                ddl: "create table subscriptions (
                    id integer primary key autoincrement,
                    user_id integer not null,
                    plan_type text not null,
                    status text default 'active',
                    payment_id text,
                    max_devices integer default 3,
                    start_date datetime,
                    end_date datetime,
                    cancelled_at datetime,
                    cancel_reason text,
                    created_at datetime default current_timestamp,
                    updated_at datetime
                )",
            },
            Unit {
                name: "create_invoices",
                guard: Guard::TableAbsent("invoices"),
                ddl: "create table invoices (
                    id integer primary key autoincrement,
                    user_id integer not null,
                    invoice_number text unique not null,
                    plan_id text,
                    amount real not null,
                    payment_id text,
                    status text default 'pending',
                    created_at datetime default current_timestamp
                )",
            },
            Unit {
                name: "create_pending_orders",
                guard: Guard::TableAbsent("pending_orders"),
                ddl: "create table pending_orders (
                    id integer primary key autoincrement,
                    user_id integer not null,
                    order_id text unique not null,
                    plan_id text not null,
                    amount real not null,
                    status text default 'pending',
                    created_at datetime default current_timestamp,
                    completed_at datetime
                )",
            },
            Unit {
                name: "create_payment_failures",
                guard: Guard::TableAbsent("payment_failures"),
                ddl: "create table payment_failures (
                    id integer primary key autoincrement,
                    user_id integer not null,
                    failure_date datetime,
                    grace_end_date datetime,
                    notified integer default 0,
                    resolved integer default 0,
                    created_at datetime default current_timestamp
                )",
            },
            Unit {
                name: "create_scheduled_revocations",
                guard: Guard::TableAbsent("scheduled_revocations"),
                ddl: "create table scheduled_revocations (
                    id integer primary key autoincrement,
                    user_id integer not null unique,
                    revoke_at datetime not null,
                    status text default 'pending',
                    completed_at datetime,
                    created_at datetime default current_timestamp
                )",
            },
            Unit {
                name: "idx_subscriptions_user",
                guard: Guard::IndexAbsent("idx_subscriptions_user"),
                ddl: "create index idx_subscriptions_user on subscriptions(user_id)",
            },
            Unit {
                name: "idx_subscriptions_status",
                guard: Guard::IndexAbsent("idx_subscriptions_status"),
                ddl: "create index idx_subscriptions_status on subscriptions(status)",
            },
            Unit {
                name: "idx_invoices_user",
                guard: Guard::IndexAbsent("idx_invoices_user"),
                ddl: "create index idx_invoices_user on invoices(user_id)",
            },
            Unit {
                name: "idx_pending_orders_order",
                guard: Guard::IndexAbsent("idx_pending_orders_order"),
                ddl: "create index idx_pending_orders_order on pending_orders(order_id)",
            },
            Unit {
                name: "idx_revocations_date",
                guard: Guard::IndexAbsent("idx_revocations_date"),
                ddl: "create index idx_revocations_date on scheduled_revocations(revoke_at)",
            },
        ],
    },
    MigrationSet {
        name: "vpn",
        database: "vpn",
        units: &[
            Unit {
                name: "create_vpn_servers",
                guard: Guard::TableAbsent("vpn_servers"),
                ddl: "create table vpn_servers (
                    id integer primary key autoincrement,
                    name text not null,
                    ip_address text not null,
                    location text,
                    region text,
                    country_code text,
                    port integer default 51820,
                    public_key text,
                    max_connections integer default 50,
                    current_load real default 0,
                    is_vip integer default 0,
                    status text default 'online',
                    provider text,
                    created_at datetime default current_timestamp
                )",
            },
            Unit {
                name: "create_user_peers",
                guard: Guard::TableAbsent("user_peers"),
                ddl: "create table user_peers (
                    id integer primary key autoincrement,
                    user_id integer not null,
                    server_id integer not null,
                    device_name text not null,
                    public_key text not null,
                    assigned_ip text not null unique,
                    status text default 'active',
                    provisioned_at datetime,
                    revoked_at datetime,
                    created_at datetime default current_timestamp,
                    updated_at datetime default current_timestamp,
                    unique(user_id, device_name)
                )",
            },
            Unit {
                name: "idx_user_peers_user",
                guard: Guard::IndexAbsent("idx_user_peers_user"),
                ddl: "create index idx_user_peers_user on user_peers(user_id)",
            },
            Unit {
                name: "idx_vpn_servers_status",
                guard: Guard::IndexAbsent("idx_vpn_servers_status"),
                ddl: "create index idx_vpn_servers_status on vpn_servers(status)",
            },
        ],
    },
];

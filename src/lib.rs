pub mod audit;
pub mod cart;
pub mod clients;
pub mod config;
pub mod db;
pub mod emails;
pub mod entity;
pub mod error;
pub mod invoice;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;

pub mod dto {
    pub mod account;
    pub mod admin;
    pub mod appointments;
    pub mod blog;
    pub mod contact;
    pub mod orders;
    pub mod payments;
    pub mod products;
    pub mod promotions;
}

pub mod middleware {
    pub mod auth;
    pub mod maintenance;
}

pub mod services {
    pub mod account_service;
    pub mod admin_service;
    pub mod appointment_service;
    pub mod blog_service;
    pub mod catalog_service;
    pub mod contact_service;
    pub mod invoice_service;
    pub mod notification_service;
    pub mod order_service;
    pub mod payment_service;
    pub mod promotion_service;
}

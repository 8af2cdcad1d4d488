pub mod addresses;
pub mod appointment_slots;
pub mod appointments;
pub mod audit_logs;
pub mod blog_posts;
pub mod brands;
pub mod lens_options;
pub mod newsletter_subscribers;
pub mod order_items;
pub mod order_status_history;
pub mod orders;
pub mod product_images;
pub mod product_variants;
pub mod products;
pub mod profiles;
pub mod promotions;

pub use addresses::Entity as Addresses;
pub use appointment_slots::Entity as AppointmentSlots;
pub use appointments::Entity as Appointments;
pub use audit_logs::Entity as AuditLogs;
pub use blog_posts::Entity as BlogPosts;
pub use brands::Entity as Brands;
pub use lens_options::Entity as LensOptions;
pub use newsletter_subscribers::Entity as NewsletterSubscribers;
pub use order_items::Entity as OrderItems;
pub use order_status_history::Entity as OrderStatusHistory;
pub use orders::Entity as Orders;
pub use product_images::Entity as ProductImages;
pub use product_variants::Entity as ProductVariants;
pub use products::Entity as Products;
pub use profiles::Entity as Profiles;
pub use promotions::Entity as Promotions;

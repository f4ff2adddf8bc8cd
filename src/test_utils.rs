use crate::diners::{Diner, Email, Order, Reservation, Review};
use crate::time_util::parse_dataset_date;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test logging in a thread-safe way.
/// This function ensures that logging is initialized only once across all tests,
/// even when multiple test files are running in parallel.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();

        // Another harness may already have installed one.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}

// Fixture builders shared by unit and integration tests.

pub fn order(item: &str, price: f64, tags: &[&str]) -> Order {
    Order {
        item: item.to_string(),
        price,
        dietary_tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

pub fn reservation(date: &str, people: u32, orders: Vec<Order>) -> Reservation {
    Reservation {
        date: parse_dataset_date(date).expect("fixture date"),
        number_of_people: people,
        orders,
    }
}

pub fn review(date: &str, restaurant: &str, rating: f64, content: &str) -> Review {
    Review {
        date: date.to_string(),
        restaurant_name: restaurant.to_string(),
        rating,
        content: content.to_string(),
    }
}

pub fn email(date: &str, subject: &str, thread: &str) -> Email {
    Email {
        date: date.to_string(),
        subject: subject.to_string(),
        combined_thread: thread.to_string(),
    }
}

pub fn diner_named(name: &str, reservations: Vec<Reservation>) -> Diner {
    Diner {
        name: name.to_string(),
        reservations,
        reviews: vec![],
        emails: vec![],
    }
}

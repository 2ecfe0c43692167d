//! Random order generation
//!
//! Draws jobs for the products registered on a line: products uniformly,
//! due dates from a normal distribution, rush orders with a fixed
//! probability. The generator is seeded so a run can be repeated exactly.

use crate::core::error::SimulationError;
use crate::core::job::JobSpec;
use crate::core::manager::Manager;
use crate::core::types::{JobId, ProductId};
use log::debug;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderGeneratorConfig {
    pub seed: u64,
    /// Number of jobs per call to [`OrderGenerator::generate`]
    pub count: usize,
    pub due_date_mean: f64,
    pub due_date_std: f64,
    /// Probability of an order being a rush order
    pub rush_probability: f64,
    pub key_prefix: String,
}

impl OrderGeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    pub fn with_due_dates(mut self, mean: f64, std: f64) -> Self {
        self.due_date_mean = mean;
        self.due_date_std = std;
        self
    }

    pub fn with_rush_probability(mut self, probability: f64) -> Self {
        self.rush_probability = probability;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }
}

impl Default for OrderGeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            count: 20,
            due_date_mean: 400.0,
            due_date_std: 150.0,
            rush_probability: 0.1,
            key_prefix: "order".to_string(),
        }
    }
}

pub struct OrderGenerator {
    config: OrderGeneratorConfig,
    rng: StdRng,
    due_dates: Normal<f64>,
    generated: usize,
}

impl OrderGenerator {
    pub fn new(config: OrderGeneratorConfig) -> Result<Self, SimulationError> {
        let due_dates = Normal::new(config.due_date_mean, config.due_date_std).map_err(|err| {
            SimulationError::InvalidConfiguration(format!("due date distribution: {}", err))
        })?;
        if !(0.0..=1.0).contains(&config.rush_probability) {
            return Err(SimulationError::InvalidConfiguration(format!(
                "rush probability {} outside [0, 1]",
                config.rush_probability
            )));
        }
        Ok(Self {
            rng: StdRng::seed_from_u64(config.seed),
            config,
            due_dates,
            generated: 0,
        })
    }

    pub fn config(&self) -> &OrderGeneratorConfig {
        &self.config
    }

    /// Jobs generated so far
    pub fn generated(&self) -> usize {
        self.generated
    }

    /// Add `count` random jobs to the line's waiting pool
    pub fn generate(&mut self, line: &mut Manager) -> Result<Vec<JobId>, SimulationError> {
        let products = line.products().len();
        if products == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "no products to generate orders for".to_string(),
            ));
        }
        let product_choice = Uniform::from(0..products);

        let mut jobs = Vec::with_capacity(self.config.count);
        for _ in 0..self.config.count {
            let product = ProductId(product_choice.sample(&mut self.rng));
            // due dates before the first time unit make no sense
            let due_date = self.due_dates.sample(&mut self.rng).max(1.0);
            let rush = self.rng.gen_bool(self.config.rush_probability);
            self.generated += 1;
            let key = format!("{}-{}", self.config.key_prefix, self.generated);
            debug!("generated {} for {} due {:.1}", key, product, due_date);
            jobs.push(line.add_job(
                JobSpec::new(product)
                    .with_key(key)
                    .with_due_date(due_date)
                    .with_rush(rush),
            )?);
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SimulationConfig;

    fn line_with_products() -> Manager {
        let mut line = Manager::new(SimulationConfig::batch());
        line.register_product("S-Klasse", 1, Vec::new()).unwrap();
        line.register_product("A-Klasse", 1, Vec::new()).unwrap();
        line
    }

    fn orders(seed: u64) -> Vec<(String, usize, f64, bool)> {
        let mut line = line_with_products();
        let config = OrderGeneratorConfig::new().with_seed(seed).with_count(12);
        let mut generator = OrderGenerator::new(config).unwrap();
        generator.generate(&mut line).unwrap();
        line.jobs()
            .iter()
            .map(|job| {
                (
                    job.key().to_string(),
                    job.product().index(),
                    job.due_date(),
                    job.is_rush(),
                )
            })
            .collect()
    }

    #[test]
    fn test_same_seed_same_orders() {
        assert_eq!(orders(7), orders(7));
    }

    #[test]
    fn test_orders_are_well_formed() {
        let generated = orders(3);
        assert_eq!(generated.len(), 12);
        assert_eq!(generated[0].0, "order-1");
        assert_eq!(generated[11].0, "order-12");
        assert!(generated.iter().all(|(_, product, due, _)| *product < 2 && *due >= 1.0));
    }

    #[test]
    fn test_keys_continue_across_calls() {
        let mut line = line_with_products();
        let mut generator =
            OrderGenerator::new(OrderGeneratorConfig::new().with_count(2)).unwrap();
        generator.generate(&mut line).unwrap();
        generator.generate(&mut line).unwrap();
        assert_eq!(generator.generated(), 4);
        assert!(line.find_job("order-4").is_some());
        assert_eq!(line.waiting_jobs().len(), 4);
    }

    #[test]
    fn test_invalid_configuration() {
        let negative_std = OrderGeneratorConfig::new().with_due_dates(100.0, -1.0);
        assert!(OrderGenerator::new(negative_std).is_err());

        let rush = OrderGeneratorConfig::new().with_rush_probability(1.5);
        assert!(matches!(
            OrderGenerator::new(rush),
            Err(SimulationError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_requires_products() {
        let mut line = Manager::new(SimulationConfig::batch());
        let mut generator = OrderGenerator::new(OrderGeneratorConfig::new()).unwrap();
        assert!(generator.generate(&mut line).is_err());
    }
}

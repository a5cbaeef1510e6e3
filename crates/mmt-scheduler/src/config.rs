//! Scheduler configuration and policy selection

use crate::error::{SchedulerError, SchedulerResult};
use crate::priority::Priority;
use crate::queue::{ClassQueues, JobQueue, UnifiedQueue};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default total capacity, in splits
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// Ordering policy of the pending queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchedulingPolicy {
    /// One FIFO per priority class, scanned most urgent first
    PriorityClasses,
    /// One queue ordered by (priority, submission time)
    #[default]
    Unified,
}

impl SchedulingPolicy {
    /// Every supported policy
    pub const ALL: [SchedulingPolicy; 2] = [SchedulingPolicy::PriorityClasses, SchedulingPolicy::Unified];

    /// Policy name as used in config files
    pub fn name(self) -> &'static str {
        match self {
            SchedulingPolicy::PriorityClasses => "priority-classes",
            SchedulingPolicy::Unified => "unified",
        }
    }

    /// Build the queue implementing this policy
    pub fn new_queue(self, config: &SchedulerConfig) -> Box<dyn JobQueue> {
        match self {
            SchedulingPolicy::PriorityClasses => Box::new(ClassQueues::new(config.class_capacities())),
            SchedulingPolicy::Unified => Box::new(UnifiedQueue::new()),
        }
    }
}

impl fmt::Display for SchedulingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SchedulingPolicy {
    type Err = SchedulerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|policy| policy.name() == s)
            .ok_or_else(|| SchedulerError::InvalidConfig(format!("unknown scheduling policy: {s}")))
    }
}

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Queue ordering policy
    pub policy: SchedulingPolicy,
    /// Maximum queued splits across all jobs
    pub queue_size: usize,
    /// Maximum queued high priority splits (priority-classes only)
    pub high_priority_queue_size: Option<usize>,
    /// Maximum queued normal priority splits (priority-classes only)
    pub normal_priority_queue_size: Option<usize>,
    /// Maximum queued background priority splits (priority-classes only)
    pub background_priority_queue_size: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            policy: SchedulingPolicy::default(),
            queue_size: DEFAULT_QUEUE_SIZE,
            high_priority_queue_size: None,
            normal_priority_queue_size: None,
            background_priority_queue_size: None,
        }
    }
}

impl SchedulerConfig {
    /// Config with the given policy and total capacity
    pub fn new(policy: SchedulingPolicy, queue_size: usize) -> Self {
        Self {
            policy,
            queue_size,
            ..Self::default()
        }
    }

    /// Per-class capacity, falling back to the total capacity
    pub fn class_capacity(&self, priority: Priority) -> usize {
        let size = match priority {
            Priority::High => self.high_priority_queue_size,
            Priority::Normal => self.normal_priority_queue_size,
            Priority::Background => self.background_priority_queue_size,
        };
        size.unwrap_or(self.queue_size)
    }

    /// Class capacities indexed by `Priority::index`
    pub fn class_capacities(&self) -> [usize; Priority::COUNT] {
        Priority::ALL.map(|priority| self.class_capacity(priority))
    }

    /// Reject configurations that could never admit a job
    pub fn validate(&self) -> SchedulerResult<()> {
        if self.queue_size == 0 {
            return Err(SchedulerError::InvalidConfig("queue_size must be > 0".into()));
        }

        for priority in Priority::ALL {
            if self.class_capacity(priority) == 0 {
                return Err(SchedulerError::InvalidConfig(format!(
                    "{priority} priority queue size must be > 0"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.policy, SchedulingPolicy::Unified);
        assert_eq!(config.queue_size, DEFAULT_QUEUE_SIZE);
        assert_eq!(config.class_capacities(), [DEFAULT_QUEUE_SIZE; 3]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_policy_names() {
        for policy in SchedulingPolicy::ALL {
            assert_eq!(policy.name().parse::<SchedulingPolicy>(), Ok(policy));
        }
        assert!(matches!(
            "round-robin".parse::<SchedulingPolicy>(),
            Err(SchedulerError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_class_capacity_override() {
        let config = SchedulerConfig {
            high_priority_queue_size: Some(8),
            ..SchedulerConfig::new(SchedulingPolicy::PriorityClasses, 64)
        };
        assert_eq!(config.class_capacities(), [8, 64, 64]);
    }

    #[test]
    fn test_validate() {
        let config = SchedulerConfig::new(SchedulingPolicy::Unified, 0);
        assert!(config.validate().is_err());

        let config = SchedulerConfig {
            background_priority_queue_size: Some(0),
            ..SchedulerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_toml() {
        let config: SchedulerConfig = toml::from_str(
            r#"
            policy = "priority-classes"
            queue_size = 32
            background_priority_queue_size = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.policy, SchedulingPolicy::PriorityClasses);
        assert_eq!(config.queue_size, 32);
        assert_eq!(config.class_capacity(Priority::Background), 4);
        assert_eq!(config.class_capacity(Priority::High), 32);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"queue_size": 5}"#).unwrap();
        assert_eq!(config.policy, SchedulingPolicy::Unified);
        assert_eq!(config.queue_size, 5);
    }
}

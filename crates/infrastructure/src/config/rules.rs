//! Declarative rules
//!
//! ```toml
//! [[rules]]
//! contract = "Catalog"
//! method = "get_by_id"
//! args = [{ match = "exactly", value = 42 }]
//! action = { type = "delay", ms = 250 }
//! trigger = { type = "random", probability = 0.5 }
//! ```

use std::time::Duration;

use application::{
    AffectedService, BehaviorRule, ChaosAction, Contract, ErrorFactory, InjectedFault,
    LatencyDistribution, Probability, TriggerPolicy,
};
use domain::{
    ArgumentMatcher, ArgumentType, AuthoringError, ContractDescriptor, InvocationSignature,
    MethodSpec,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ChaosConfig, ConfigError};

/// One rule as written in a configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Contract name as given by its descriptor
    pub contract: String,
    /// Method to intercept
    pub method: String,
    /// Positional argument matchers
    #[serde(default)]
    pub args: Vec<ArgConfig>,
    /// What happens when the rule fires
    pub action: ActionConfig,
    /// When the rule fires
    #[serde(default)]
    pub trigger: TriggerConfig,
}

/// Argument matcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "match", rename_all = "snake_case")]
pub enum ArgConfig {
    /// Any value of the parameter's type
    Any,
    /// Exactly this value
    Exactly {
        /// Value deserialized into the parameter's type
        value: serde_json::Value,
    },
}

/// Chaos action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionConfig {
    /// Fixed delay
    Delay { ms: u64 },
    /// Uniformly random delay
    DelayBetween { min_ms: u64, max_ms: u64 },
    /// Fail with an injected fault
    Throw { message: String },
    /// Fixed delay, then fail with an injected fault
    DelayThenThrow { ms: u64, message: String },
}

impl ActionConfig {
    /// Latency injected by this action, if any
    pub const fn latency(&self) -> Option<LatencyDistribution> {
        match *self {
            Self::Delay { ms } | Self::DelayThenThrow { ms, .. } => {
                Some(LatencyDistribution::constant(Duration::from_millis(ms)))
            },
            Self::DelayBetween { min_ms, max_ms } => Some(LatencyDistribution::uniform(
                Duration::from_millis(min_ms),
                Duration::from_millis(max_ms),
            )),
            Self::Throw { .. } => None,
        }
    }

    /// Build the action for a contract whose errors accept injected faults
    pub fn to_action<E>(&self) -> ChaosAction<E>
    where
        E: From<InjectedFault> + Send + 'static,
    {
        match self {
            Self::Delay { ms } => ChaosAction::delay(Duration::from_millis(*ms)),
            Self::DelayBetween { min_ms, max_ms } => ChaosAction::Delay(LatencyDistribution::uniform(
                Duration::from_millis(*min_ms),
                Duration::from_millis(*max_ms),
            )),
            Self::Throw { message } => ChaosAction::Throw(fault(message)),
            Self::DelayThenThrow { ms, message } => ChaosAction::DelayThenThrow {
                latency: LatencyDistribution::constant(Duration::from_millis(*ms)),
                error: fault(message),
            },
        }
    }
}

fn fault<E>(message: &str) -> ErrorFactory<E>
where
    E: From<InjectedFault> + Send + 'static,
{
    let message = message.to_string();
    ErrorFactory::new(move |_| InjectedFault::new(message.clone()))
}

/// Trigger policy; `always` when omitted
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerConfig {
    /// Every matching call
    #[default]
    Always,
    /// With a probability, or the configured default
    Random {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        probability: Option<f64>,
    },
    /// Every `n`th matching call
    EveryNth { n: u64 },
    /// Every matching call after the first `n`
    After { n: u64 },
    /// The first `n` matching calls
    AtMost { n: u64 },
}

impl TriggerConfig {
    /// Build a fresh policy; counters of stateful policies start at zero
    ///
    /// # Errors
    ///
    /// Returns [`AuthoringError::InvalidProbability`] for a probability
    /// outside `[0, 1]`.
    pub fn to_policy(&self, default_probability: f64) -> Result<TriggerPolicy, AuthoringError> {
        Ok(match *self {
            Self::Always => TriggerPolicy::Always,
            Self::Random { probability } => {
                TriggerPolicy::Random(Probability::new(probability.unwrap_or(default_probability))?)
            },
            Self::EveryNth { n } => TriggerPolicy::every_nth(n),
            Self::After { n } => TriggerPolicy::after(n),
            Self::AtMost { n } => TriggerPolicy::at_most(n),
        })
    }
}

impl RuleConfig {
    /// Resolve the declared arguments against the contract's methods
    ///
    /// Methods sharing the name and arity are tried in declaration order;
    /// the first whose parameter types accept every declared value wins.
    ///
    /// # Errors
    ///
    /// Returns an error if no method fits or a value cannot be parsed.
    pub fn signature(
        &self,
        descriptor: &ContractDescriptor,
    ) -> Result<InvocationSignature, AuthoringError> {
        let mut first_error = None;
        for method in descriptor.overloads(&self.method, self.args.len()) {
            match self.matchers_for(method) {
                Ok(matchers) => return InvocationSignature::new(&self.method, matchers),
                Err(err) => {
                    first_error.get_or_insert(err);
                },
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        // No candidate: let the descriptor say whether the name or the arity is off.
        let untyped = InvocationSignature::new(
            &self.method,
            self.args
                .iter()
                .map(|_| ArgumentMatcher::Any(ArgumentType::of::<serde_json::Value>())),
        )?;
        descriptor.validate(&untyped)?;
        Err(AuthoringError::unknown_method(descriptor.name(), &self.method))
    }

    fn matchers_for(&self, method: &MethodSpec) -> Result<Vec<ArgumentMatcher>, AuthoringError> {
        self.args
            .iter()
            .zip(method.params())
            .enumerate()
            .map(|(position, (arg, param))| match arg {
                ArgConfig::Any => Ok(param.any_matcher()),
                ArgConfig::Exactly { value } => param
                    .parse_value(value)
                    .map_err(|reason| AuthoringError::invalid_argument(&self.method, position, reason)),
            })
            .collect()
    }

    /// Build the rule for contract `C`
    ///
    /// # Errors
    ///
    /// Returns the first authoring error of the signature, action or trigger.
    pub fn build<C>(
        &self,
        descriptor: &ContractDescriptor,
        default_probability: f64,
    ) -> Result<BehaviorRule<C>, AuthoringError>
    where
        C: Contract + ?Sized,
        C::Error: From<InjectedFault>,
    {
        let signature = self.signature(descriptor)?;
        let action = self.action.to_action::<C::Error>();
        action.validate()?;
        let trigger = self.trigger.to_policy(default_probability)?;
        Ok(BehaviorRule::new(signature, action, trigger))
    }
}

/// Applying configured rules to an affected service
pub trait ConfiguredRules {
    /// Append every rule of `config` targeting this contract
    ///
    /// All rules are built before any is added, so a bad rule leaves the
    /// service unchanged. Returns the number of rules added.
    ///
    /// # Errors
    ///
    /// Returns the first invalid rule with its index in the file.
    fn load_rules(&self, config: &ChaosConfig) -> Result<usize, ConfigError>;
}

impl<C> ConfiguredRules for AffectedService<C>
where
    C: Contract + ?Sized,
    C::Error: From<InjectedFault>,
{
    fn load_rules(&self, config: &ChaosConfig) -> Result<usize, ConfigError> {
        let default_probability = self.settings().default_probability;
        let rules = config
            .rules_for(self.contract_name())
            .map(|(index, rule)| {
                rule.build::<C>(self.descriptor(), default_probability)
                    .map_err(|source| ConfigError::rule(index, rule, source))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let count = rules.len();
        for rule in rules {
            self.add_rule(rule)
                .map_err(ConfigError::Invalid)?;
        }

        info!(
            contract = self.contract_name(),
            rules = count,
            "Configured chaos rules loaded"
        );
        Ok(count)
    }
}

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use hourglass_rs::SafeTimeProvider;
use tokio::sync::watch;

use crate::api::LendingApi;
use crate::config::FrontendConfig;
use crate::coordinator::{CoordinatorBinding, OverviewCoordinator};
use crate::events::{Event, EventLog};
use crate::forms::{FormContext, LoanApplicationForm, PaymentForm};
use crate::ledger::LedgerViewer;
use crate::render;
use crate::resolver::DebouncedResolver;
use crate::state::FetchState;
use crate::types::PaymentType;

pub const HELP: &str = "\
commands:
  customer <id>                      set the customer id (debounced)
  apply <amount> <rate%> <years>     apply for a loan for the current customer
  quote <amount> <rate%> <years>     show indicative figures without applying
  pay <loan_id> <amount> [emi|lump]  record a payment
  ledger <loan_id>                   show a loan's transactions
  view <overview|apply|pay|ledger>   switch view
  refresh                            re-fetch the overview
  events                             list recorded events
  help                               show this text
  quit                               exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Overview,
    Apply,
    Pay,
    Ledger,
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            View::Overview => "overview",
            View::Apply => "apply",
            View::Pay => "pay",
            View::Ledger => "ledger",
        };
        f.write_str(name)
    }
}

impl FromStr for View {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" | "home" => Ok(View::Overview),
            "apply" => Ok(View::Apply),
            "pay" | "payment" => Ok(View::Pay),
            "ledger" => Ok(View::Ledger),
            other => Err(format!("unknown view: {}", other)),
        }
    }
}

/// loan fields as typed; validation happens in the form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoanTerms {
    pub amount: String,
    pub rate: String,
    pub years: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Customer(String),
    Apply(LoanTerms),
    Quote(LoanTerms),
    Pay {
        loan_id: String,
        amount: String,
        payment_type: PaymentType,
    },
    Ledger(String),
    View(View),
    Refresh,
    Events,
    Help,
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Result<Command, String> {
        let line = line.trim_start();
        let (word, rest) = match line.find(char::is_whitespace) {
            Some(idx) => (&line[..idx], &line[idx..]),
            None => (line, ""),
        };
        let args: Vec<&str> = rest.split_whitespace().collect();

        match word.to_ascii_lowercase().as_str() {
            // the rest of the line goes to the resolver untouched
            "customer" | "c" => Ok(Command::Customer(rest.strip_prefix(' ').unwrap_or(rest).to_string())),
            "apply" => terms(&args).map(Command::Apply),
            "quote" => terms(&args).map(Command::Quote),
            "pay" => match args.as_slice() {
                [loan_id, amount] => Ok(Command::Pay {
                    loan_id: loan_id.to_string(),
                    amount: amount.to_string(),
                    payment_type: PaymentType::Emi,
                }),
                [loan_id, amount, kind] => Ok(Command::Pay {
                    loan_id: loan_id.to_string(),
                    amount: amount.to_string(),
                    payment_type: kind.parse()?,
                }),
                _ => Err("usage: pay <loan_id> <amount> [emi|lump]".to_string()),
            },
            "ledger" => match args.as_slice() {
                [loan_id] => Ok(Command::Ledger(loan_id.to_string())),
                _ => Err("usage: ledger <loan_id>".to_string()),
            },
            "view" => match args.as_slice() {
                [name] => name.parse().map(Command::View),
                _ => Err("usage: view <overview|apply|pay|ledger>".to_string()),
            },
            "refresh" => Ok(Command::Refresh),
            "events" => Ok(Command::Events),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            "" => Err("type `help` for commands".to_string()),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

fn terms(args: &[&str]) -> Result<LoanTerms, String> {
    match args {
        [amount, rate, years] => Ok(LoanTerms {
            amount: amount.to_string(),
            rate: rate.to_string(),
            years: years.to_string(),
        }),
        _ => Err("usage: <amount> <rate%> <years>".to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Quit,
}

/// the running frontend; must be created inside a tokio runtime
pub struct App {
    view: View,
    resolver: DebouncedResolver,
    coordinator: Arc<OverviewCoordinator>,
    binding: Option<CoordinatorBinding>,
    apply: LoanApplicationForm,
    payment: PaymentForm,
    ledger: LedgerViewer,
    events: EventLog,
}

impl App {
    pub fn new(config: &FrontendConfig, api: Arc<dyn LendingApi>, time: Arc<SafeTimeProvider>) -> Self {
        let events = EventLog::new();
        let resolver = DebouncedResolver::new(config.debounce_window(), events.clone(), time.clone());
        let coordinator = Arc::new(OverviewCoordinator::new(
            api.clone(),
            resolver.subscribe(),
            events.clone(),
            time.clone(),
        ));
        let binding = coordinator.bind();

        let ctx = FormContext {
            api,
            refresher: coordinator.clone(),
            events: events.clone(),
            time,
        };

        Self {
            view: View::Overview,
            resolver,
            coordinator,
            binding: Some(binding),
            apply: LoanApplicationForm::new(ctx.clone()),
            payment: PaymentForm::new(ctx.clone()),
            ledger: LedgerViewer::new(ctx),
            events,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn overview(&self) -> FetchState {
        self.coordinator.state()
    }

    /// receiver notified whenever the overview state changes
    pub fn subscribe_overview(&self) -> watch::Receiver<FetchState> {
        self.coordinator.subscribe()
    }

    pub async fn handle(&mut self, command: Command) -> Flow {
        let output = match command {
            Command::Quit => return Flow::Quit,
            Command::Help => HELP.to_string(),
            Command::Customer(raw) => {
                self.resolver.input(&raw);
                self.view = View::Overview;
                if raw.trim().is_empty() {
                    "Customer cleared.".to_string()
                } else {
                    format!("Looking up {:?}...", raw.trim())
                }
            }
            Command::View(view) => {
                self.view = view;
                self.render()
            }
            Command::Refresh => {
                self.coordinator.refresh().await;
                self.view = View::Overview;
                self.render()
            }
            Command::Quote(terms) => {
                self.fill_application(terms);
                match self.apply.quote() {
                    Some(quote) => render::quote(&quote),
                    None => match self.apply.validate() {
                        Err(err) => format!("Cannot quote: {}", err.user_message()),
                        Ok(_) => "Cannot quote these terms.".to_string(),
                    },
                }
            }
            Command::Apply(terms) => {
                self.fill_application(terms);
                self.view = View::Apply;
                self.apply.submit().await.ok();
                self.render()
            }
            Command::Pay {
                loan_id,
                amount,
                payment_type,
            } => {
                self.payment.loan_id = loan_id;
                self.payment.amount = amount;
                self.payment.payment_type = payment_type;
                self.view = View::Pay;
                self.payment.submit().await.ok();
                self.render()
            }
            Command::Ledger(loan_id) => {
                self.ledger.loan_id = loan_id;
                self.view = View::Ledger;
                self.ledger.load().await.ok();
                self.render()
            }
            Command::Events => {
                let events = self.events.snapshot();
                if events.is_empty() {
                    "No events recorded.".to_string()
                } else {
                    events.iter().map(describe).collect::<Vec<_>>().join("\n")
                }
            }
        };
        Flow::Continue(output)
    }

    /// text for the active view
    pub fn render(&self) -> String {
        match self.view {
            View::Overview => render::overview(&self.coordinator.state()),
            View::Apply => render::application(self.apply.state()),
            View::Pay => render::payment(self.payment.state()),
            View::Ledger => render::ledger(self.ledger.state()),
        }
    }

    /// stop following identifier publications and drop any pending one
    pub fn shutdown(mut self) {
        if let Some(binding) = self.binding.take() {
            binding.unbind();
        }
        self.resolver.shutdown();
    }

    fn fill_application(&mut self, terms: LoanTerms) {
        self.apply.reset();
        // applications always go to the customer whose overview is shown
        self.apply.customer_id = self.coordinator.current_identifier();
        self.apply.loan_amount = terms.amount;
        self.apply.interest_rate = terms.rate;
        self.apply.period_years = terms.years;
    }
}

fn describe(event: &Event) -> String {
    match event {
        Event::IdentifierPublished { identifier, timestamp } => {
            format!("{} identifier published: {:?}", timestamp.format("%H:%M:%S%.3f"), identifier)
        }
        Event::FetchStarted {
            customer_id,
            generation,
            timestamp,
            ..
        } => format!("{} fetch #{} started for {}", timestamp.format("%H:%M:%S%.3f"), generation, customer_id),
        Event::FetchSucceeded {
            customer_id,
            loan_count,
            timestamp,
            ..
        } => format!("{} fetch for {} returned {} loan(s)", timestamp.format("%H:%M:%S%.3f"), customer_id, loan_count),
        Event::FetchFailed {
            customer_id,
            message,
            timestamp,
            ..
        } => format!("{} fetch for {} failed: {}", timestamp.format("%H:%M:%S%.3f"), customer_id, message),
        Event::FetchDiscarded {
            customer_id,
            generation,
            timestamp,
            ..
        } => format!("{} stale fetch #{} for {} discarded", timestamp.format("%H:%M:%S%.3f"), generation, customer_id),
        Event::StateCleared { timestamp } => format!("{} overview cleared", timestamp.format("%H:%M:%S%.3f")),
        Event::LoanCreated {
            loan_id,
            customer_id,
            monthly_emi,
            timestamp,
        } => format!(
            "{} loan {} created for {} (EMI {})",
            timestamp.format("%H:%M:%S%.3f"),
            loan_id,
            customer_id,
            monthly_emi
        ),
        Event::PaymentRecorded {
            payment_id,
            loan_id,
            amount,
            payment_type,
            remaining_balance,
            timestamp,
        } => format!(
            "{} payment {} of {} ({}) on {}, remaining {}",
            timestamp.format("%H:%M:%S%.3f"),
            payment_id,
            amount,
            payment_type,
            loan_id,
            remaining_balance
        ),
        Event::LedgerLoaded {
            loan_id,
            transaction_count,
            timestamp,
        } => format!(
            "{} ledger for {} loaded ({} transaction(s))",
            timestamp.format("%H:%M:%S%.3f"),
            loan_id,
            transaction_count
        ),
    }
}

use crate::infra::{build_service, parse_date, InMemoryCreditService};
use chrono::{Duration, Local, NaiveDate};
use clap::Args;
use trade_credit::error::AppError;
use trade_credit::workflows::credit::{
    Actor, AmountType, ContractDecision, ContractId, CreditAssessment, CreditInfo, NewContract,
    PaymentMethod, PaymentRequest, Role, UserId, VerificationDecision,
};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Activation date for the demo contracts (YYYY-MM-DD). Defaults to 75
    /// days before today so one contract is mid-schedule.
    #[arg(long, value_parser = parse_date)]
    pub(crate) activated_on: Option<NaiveDate>,
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Retailer to score (defaults to the seeded demo retailer)
    #[arg(long, default_value = "ret-1")]
    pub(crate) retailer: String,
    /// Activation date for the demo contracts (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) activated_on: Option<NaiveDate>,
    /// Reporting date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) as_of: Option<NaiveDate>,
}

fn retailer_actor() -> Actor {
    Actor::new("ret-1", Role::Retailer)
}

fn supplier_actor(id: &str) -> Actor {
    Actor::new(id, Role::Supplier)
}

fn admin_actor() -> Actor {
    Actor::new("ops", Role::Admin)
}

fn installment_payment() -> PaymentRequest {
    PaymentRequest {
        amount_type: AmountType::Installment,
        custom_amount: None,
        method: PaymentMethod::BankTransfer,
        notes: None,
    }
}

fn pay_and_verify(
    service: &InMemoryCreditService,
    supplier: &str,
    contract: &ContractId,
    on: NaiveDate,
) -> Result<(), AppError> {
    let payment = service.record_payment(&retailer_actor(), contract, installment_payment(), on)?;
    service.verify_payment(
        &supplier_actor(supplier),
        &payment.id,
        VerificationDecision::Verify,
        on,
    )?;
    Ok(())
}

/// Seed the scripted ledger both the demo and the report command narrate:
/// one well-serviced contract with the first supplier and one slipped
/// contract with the second.
fn seed_demo_ledger(
    service: &InMemoryCreditService,
    activated: NaiveDate,
) -> Result<(ContractId, ContractId), AppError> {
    let steady = service.create_contract(
        &retailer_actor(),
        NewContract {
            supplier_id: UserId("sup-1".to_string()),
            retailer_id: UserId("ret-1".to_string()),
            amount: 60000.0,
            number_of_payments: 6,
            payment_terms_days: 30,
            description: "seasonal stock, six monthly installments".to_string(),
            start_date: Some(activated),
            end_date: None,
        },
    )?;
    service.decide_contract(
        &supplier_actor("sup-1"),
        &steady.id,
        ContractDecision::Approve,
        activated,
    )?;
    for offset in [0, 30, 60] {
        pay_and_verify(
            service,
            "sup-1",
            &steady.id,
            activated + Duration::days(offset),
        )?;
    }

    let slipped = service.create_contract(
        &retailer_actor(),
        NewContract {
            supplier_id: UserId("sup-2".to_string()),
            retailer_id: UserId("ret-1".to_string()),
            amount: 20000.0,
            number_of_payments: 2,
            payment_terms_days: 30,
            description: "counter equipment".to_string(),
            start_date: Some(activated),
            end_date: None,
        },
    )?;
    service.decide_contract(
        &supplier_actor("sup-2"),
        &slipped.id,
        ContractDecision::Approve,
        activated,
    )?;
    // First installment lands forty days late.
    pay_and_verify(
        service,
        "sup-2",
        &slipped.id,
        activated + Duration::days(40),
    )?;

    Ok((steady.id, slipped.id))
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let activated = args
        .activated_on
        .unwrap_or_else(|| today - Duration::days(75));

    let service = build_service();
    println!("Trade credit walkthrough (activated {activated}, reporting {today})");
    println!("================================================================");

    let (steady, slipped) = seed_demo_ledger(&service, activated)?;
    println!("\nContracts");
    for id in [&steady, &slipped] {
        let statement = service.contract_statement(&admin_actor(), id, today)?;
        println!(
            "- {} | {} | {:.2} over {} installments | status {} | paid {:.2} | remaining {:.2} ({} installments left)",
            statement.contract.id,
            statement.contract.description,
            statement.contract.amount,
            statement.contract.number_of_payments,
            statement.effective_status,
            statement.paid_so_far,
            statement.remaining,
            statement.remaining_installments,
        );
    }

    let flagged = service.sweep_overdue(today)?;
    if flagged.is_empty() {
        println!("\nOverdue sweep: nothing newly flagged");
    } else {
        println!("\nOverdue sweep flagged:");
        for id in &flagged {
            println!("- {id}");
        }
    }

    println!("\nSupplier view (Harbor Wholesale)");
    render_assessment(&service.credit_report(
        &supplier_actor("sup-1"),
        &UserId("ret-1".to_string()),
        today,
    )?);

    println!("\nGlobal view (all suppliers)");
    render_assessment(&service.credit_report(&admin_actor(), &UserId("ret-1".to_string()), today)?);

    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let as_of = args.as_of.unwrap_or_else(|| Local::now().date_naive());
    let activated = args
        .activated_on
        .unwrap_or_else(|| as_of - Duration::days(75));

    let service = build_service();
    seed_demo_ledger(&service, activated)?;
    service.sweep_overdue(as_of)?;

    let report =
        service.credit_report(&admin_actor(), &UserId(args.retailer.clone()), as_of)?;
    println!("Credit report for {} as of {as_of}", args.retailer);
    println!("========================================");
    render_assessment(&report);
    Ok(())
}

fn render_assessment(assessment: &CreditAssessment) {
    match assessment {
        CreditAssessment::Unrated { retailer_id } => {
            println!("{retailer_id}: unrated (no scoreable history)");
        }
        CreditAssessment::Rated(info) => render_info(info),
    }
}

fn render_info(info: &CreditInfo) {
    println!(
        "Rating {} (risk {}) | payment score {:.1} | success rate {:.1}% | avg delay {:.1}d",
        info.credit_rating, info.risk_level, info.payment_score, info.contract_success_rate,
        info.average_delay_days,
    );
    println!(
        "Contracts: {} total, {} active | commitments {:.2} | paid {:.2} | overdue {:.2}",
        info.total_contracts,
        info.active_contracts,
        info.total_commitments,
        info.paid_amount,
        info.overdue_amount,
    );
    if !info.monthly_history.is_empty() {
        println!("Monthly history");
        for record in &info.monthly_history {
            println!(
                "- {} | due {:.2} | paid {:.2} | {}",
                record.month,
                record.due,
                record.paid,
                if record.on_time { "on time" } else { "late or open" }
            );
        }
    }
}

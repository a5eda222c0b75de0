//! Mobile cashier and fixed cashier group example

use eventbar_core::export::closings_csv;
use eventbar_core::{
    Adjustment, BackOffice, CashierClosingForm, Cents, ClosingHistory, ClosingInput,
    ClosingService, FixedCashierEntry, FixedClosingForm, MemoryBackOffice, Person, Session, User,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("eventbar_core=info".parse()?))
        .init();

    println!("💵 EventBar - Cashier Closings Example\n");

    let backend = MemoryBackOffice::new().with_cashiers(vec![
        Person::new("555.666.777-88", "Ana Lima"),
        Person::new("999.888.777-66", "Bia Rocha"),
    ]);
    let mut session = Session::for_user(&User {
        cpf: "111.222.333-44".to_string(),
        name: "Fabio".to_string(),
        dob: "05/06/1985".to_string(),
        profile: "caixa".to_string(),
        permissions: String::new(),
    });
    session.select_event("Festa Junina");

    let mut service = ClosingService::new(backend.clone());
    let cashiers = service.cashiers().await?;

    // 1. Mobile cashier with a change float
    let mut mobile = CashierClosingForm::new(cashiers[0].clone(), "C-01");
    mobile.input = ClosingInput {
        gross_sales: Cents::from_major(800),
        credit: Cents::from_major(300),
        change: Adjustment::of(Cents::from_major(100)),
        physical_cash: Cents::from_major(590),
        ..ClosingInput::default()
    };
    let balance = service.preview_cashier(&mobile);
    println!(
        "📱 {}: expected {}, counted {}, difference {} ({:?})",
        cashiers[0].name, balance.expected_cash, balance.counted_cash, balance.difference, balance.state
    );
    service.submit_cashier(&session, &mobile).await?;

    // 2. Fixed group sharing one change float
    let group = FixedClosingForm {
        group_change: Adjustment::of(Cents::from_major(50)),
        entries: vec![
            FixedCashierEntry::new(
                cashiers[0].clone(),
                "F1",
                ClosingInput {
                    gross_sales: Cents::from_major(300),
                    physical_cash: Cents::from_major(330),
                    ..ClosingInput::default()
                },
            ),
            FixedCashierEntry::new(
                cashiers[1].clone(),
                "F2",
                ClosingInput {
                    gross_sales: Cents::from_major(200),
                    debit: Cents::from_major(50),
                    physical_cash: Cents::from_major(175),
                    ..ClosingInput::default()
                },
            ),
        ],
    };
    let result = service.preview_fixed(&group);
    println!("\n🏪 Fixed group");
    for (name, entry) in group.cashier_names().iter().zip(&result.entries) {
        println!("  {name}: difference {}", entry.difference);
    }
    println!(
        "  Group: counted {}, expected {}, change {}, difference {}",
        result.total_counted, result.group_expected, result.group_change, result.group_difference
    );
    let receipt = service.submit_fixed(&session, &group).await?;
    println!("✅ Group protocol {}", receipt.protocol);

    // 3. Export
    let history = ClosingHistory::new("Festa Junina", backend.list_closings("Festa Junina").await?);
    println!("\n📄 CSV\n{}", closings_csv(history.records())?);

    Ok(())
}

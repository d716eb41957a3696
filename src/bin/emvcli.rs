//! Thin PC/SC-backed demo CLI, grounded on the teacher's `main.rs`
//! (`StructOpt` option parsing, `pcsc::Context`/`pcsc::Card` handling) but
//! retargeted at the library's entry point and kernel dispatch instead of
//! the teacher's single `pse::list_applications` call.

use anyhow::Context;
use chrono::Utc;
use structopt::StructOpt;

use softpos_emv_engine::config::Config;
use softpos_emv_engine::crypto::CaKeyStore;
use softpos_emv_engine::entry_point;
use softpos_emv_engine::error::EngineError;
use softpos_emv_engine::io::{CardTransceiver, CommandApdu, OnlineAuthorizationResponse, OnlineAuthorizer, ResponseApdu};
use softpos_emv_engine::kernel::{self, auth_request::AuthorizationRequest, outcome::KernelOutcome};

#[derive(Debug, StructOpt)]
struct Options {
    #[structopt(short, long, default_value = "0", help = "Reader index, see list-readers")]
    reader: usize,
    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    #[structopt(about = "List connected readers")]
    ListReaders,
    #[structopt(about = "List PPSE candidates on the presented card")]
    ShowCandidates,
    #[structopt(about = "Run a transaction for the given amount, in cents")]
    Pay {
        #[structopt(long)]
        amount_cents: u64,
    },
}

struct PcscTransceiver<'a> {
    card: &'a mut pcsc::Card,
}

impl<'a> CardTransceiver for PcscTransceiver<'a> {
    fn transceive(&mut self, command: &CommandApdu) -> Result<ResponseApdu, EngineError> {
        let encoded = command
            .encode()
            .ok_or_else(|| EngineError::Internal("command APDU too long to encode".to_string()))?;
        let mut buf = [0u8; 2048];
        let response = self
            .card
            .transmit(&encoded, &mut buf)
            .map_err(|e| EngineError::Communication(e.to_string()))?;
        let (data, sw) = response.split_at(response.len() - 2);
        Ok(ResponseApdu {
            data: data.to_vec(),
            sw: u16::from_be_bytes([sw[0], sw[1]]),
        })
    }
}

/// Declines every request offline-incapable demo environments cannot
/// actually route to a host; swap for a real `OnlineAuthorizer` backed by
/// the acquirer's HTTP API in production.
struct DemoOfflineAuthorizer;

impl OnlineAuthorizer for DemoOfflineAuthorizer {
    fn authorize(&mut self, _request: &AuthorizationRequest) -> Result<OnlineAuthorizationResponse, EngineError> {
        Ok(OnlineAuthorizationResponse {
            approved: false,
            authorization_code: None,
            arc: [0x30, 0x35],
            arpc: Vec::new(),
            scripts_pre_ac: Vec::new(),
            scripts_post_ac: Vec::new(),
            issuer_auth_data: None,
        })
    }
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let options = Options::from_args();
    let context = pcsc::Context::establish(pcsc::Scope::User).context("failed to create PC/SC session")?;

    match options.cmd {
        Command::ListReaders => list_readers(&context),
        Command::ShowCandidates => {
            let mut card = get_card(&options, &context)?;
            let candidates = {
                let mut transceiver = PcscTransceiver { card: &mut card };
                entry_point::select_ppse(&mut transceiver)?
            };
            println!("{candidates:#?}");
            reset(card);
            Ok(())
        }
        Command::Pay { amount_cents } => {
            let mut card = get_card(&options, &context)?;
            let config = Config::default();
            let ca_keys = CaKeyStore::new();
            let mut authorizer = DemoOfflineAuthorizer;
            let today = Utc::now().date_naive();
            let ctx = kernel::TransactionContext {
                amount_authorized_cents: amount_cents,
                amount_other_cents: 0,
                terminal_country_code: [0x08, 0x40],
                transaction_currency_code: [0x08, 0x40],
                transaction_type: 0x00,
                transaction_date: [0, 0, 0],
                transaction_time: [0, 0, 0],
                unpredictable_number: rand::random(),
                terminal_type: 0x22,
                terminal_capabilities: [0x00, 0x00, 0x00],
                online_capable: true,
                online_pin_supported: false,
                cdcvm_performed: false,
                today,
                test_issuer_master_key: None,
            };

            let outcome = {
                let mut transceiver = PcscTransceiver { card: &mut card };
                let candidates = entry_point::select_ppse(&mut transceiver)?;
                let candidate = candidates.first().context("card advertised no applications")?;
                let kernel_impl = entry_point::kernel_for_aid(&candidate.aid)
                    .context("no kernel registered for this application's RID")?;
                kernel::run_transaction(
                    kernel_impl.as_ref(),
                    &candidate.aid,
                    &config,
                    &ca_keys,
                    &mut transceiver,
                    &mut authorizer,
                    &ctx,
                )
            };
            reset(card);
            match outcome? {
                KernelOutcome::Approved(_) => println!("APPROVED"),
                KernelOutcome::Declined(_, reason) => println!("DECLINED: {reason}"),
                other => println!("{other:?}"),
            }
            Ok(())
        }
    }
}

fn list_readers(context: &pcsc::Context) -> anyhow::Result<()> {
    let readers = context.list_readers_owned().context("failed to list readers")?;
    for (idx, reader) in readers.iter().enumerate() {
        println!("{idx}: {reader:?}");
    }
    Ok(())
}

fn get_card(options: &Options, context: &pcsc::Context) -> anyhow::Result<pcsc::Card> {
    let readers = context.list_readers_owned().context("failed to list readers")?;
    let reader = readers
        .get(options.reader)
        .with_context(|| format!("no reader at index {}, only {} found", options.reader, readers.len()))?;
    Ok(context.connect(reader, pcsc::ShareMode::Exclusive, pcsc::Protocols::ANY)?)
}

fn reset(card: pcsc::Card) {
    if card.disconnect(pcsc::Disposition::ResetCard).is_err() {
        eprintln!("failed to reset card, you may need to manually remove it");
    }
}

//! Property-based simulation tests.
//!
//! Random operation sequences across several clients sharing one broker.
//! After every operation the system settles and the standard invariants are
//! checked, so any interleaving that breaks ordering, duplicates records or
//! double-announces a leave is caught and shrunk by proptest.

use proptest::prelude::*;
use stompchat_app::Runtime;
use stompchat_client::{ClientConfig, ConnectionStatus, Identity};
use stompchat_harness::{
    ClientSnapshot, InvariantRegistry, SharedSimBroker, SimDriver, SimInput, SystemSnapshot,
    create_shared_broker,
};

const CLIENTS: usize = 3;
const NAMES: [&str; CLIENTS] = ["Alice", "Bob", "Carol"];

#[derive(Debug, Clone)]
enum Operation {
    Send { client: usize, text: String },
    Reconnect { client: usize },
    ServerDrop { client: usize },
}

fn operation() -> impl Strategy<Value = Operation> {
    let client = 0..CLIENTS;
    prop_oneof![
        6 => (client.clone(), "[a-z ]{0,12}")
            .prop_map(|(client, text)| Operation::Send { client, text }),
        1 => client.clone().prop_map(|client| Operation::Reconnect { client }),
        1 => client.prop_map(|client| Operation::ServerDrop { client }),
    ]
}

struct World {
    broker: SharedSimBroker,
    runtimes: Vec<Runtime<SimDriver>>,
    handles: Vec<SimDriver>,
}

impl World {
    async fn start() -> Self {
        let broker = create_shared_broker();
        let mut world = Self { broker: broker.clone(), runtimes: Vec::new(), handles: Vec::new() };

        for name in NAMES {
            let driver = SimDriver::new(broker.clone());
            world.handles.push(driver.clone());
            let mut runtime =
                Runtime::new(driver, Identity::new(name), ClientConfig::with_endpoint("sim://broker"));
            runtime.start().await.unwrap();
            world.runtimes.push(runtime);
            world.settle().await;
        }
        world
    }

    async fn settle(&mut self) {
        for _ in 0..64 {
            for runtime in &mut self.runtimes {
                assert!(!runtime.step().await.unwrap());
            }
            if self.handles.iter().all(|h| !h.has_pending()) {
                return;
            }
        }
        panic!("simulation did not settle");
    }

    fn apply(&self, operation: &Operation) {
        match operation {
            Operation::Send { client, text } => self.handles[*client].inject_send(text.clone()),
            Operation::Reconnect { client } => self.handles[*client].inject(SimInput::Reconnect),
            Operation::ServerDrop { client } => {
                if let Some(session) = self.handles[*client].session() {
                    self.broker.lock().unwrap().drop_session(session);
                }
            },
        }
    }

    fn snapshot(&self) -> SystemSnapshot {
        let history = self.broker.lock().unwrap().history().to_vec();
        self.runtimes.iter().fold(SystemSnapshot::new(history), |snapshot, runtime| {
            snapshot.with_client(ClientSnapshot::from_controller(runtime.controller()))
        })
    }
}

fn block_on<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(future)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_under_random_traffic(
        operations in prop::collection::vec(operation(), 1..40),
    ) {
        block_on(async {
            let registry = InvariantRegistry::standard();
            let mut world = World::start().await;

            for operation in &operations {
                world.apply(operation);
                world.settle().await;

                if let Err(violations) = registry.check_all(&world.snapshot()) {
                    panic!("after {operation:?}: {violations:?}");
                }
            }

            for runtime in &mut world.runtimes {
                runtime.shutdown().await.unwrap();
            }

            // PROPERTY: shutdown leaves nobody connected and every join matched
            let snapshot = world.snapshot();
            assert!(snapshot.clients.iter().all(|c| c.status != ConnectionStatus::Connected));
            assert_eq!(registry.check_all(&snapshot), Ok(()));
            for handle in &world.handles {
                assert_eq!(handle.connect_count(), handle.close_count());
            }
        });
    }
}

//! A physical action fed from a background thread reading stdin lines,
//! demonstrating the cross-thread inbox: the scheduler thread never reads
//! stdin itself, it only reacts to values handed to it through a
//! `PhysicalInjector`.

use std::io::BufRead;
use std::thread;

use reactor_rt::{Config, Direction, EmptyState, Env, Origin, ReactionSpec, Scheduler, TimeValue};

fn main() {
    tracing_subscriber::fmt::init();

    let mut env = Env::new();
    let echo = env.new_reactor("echo", None, Box::new(EmptyState));
    let line_in = env.new_action::<String>(echo, "line", TimeValue::ZERO, Origin::Physical);
    let echoed = env.new_port::<String>(echo, "echoed", Direction::Output);

    env.add_reaction(ReactionSpec {
        name: "on_line".to_string(),
        reactor_key: echo,
        trigger_ports: Vec::new(),
        trigger_actions: vec![line_in],
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: vec![echoed],
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            let Some(line) = ctx.get_action::<String>(line_in).unwrap() else {
                return;
            };
            if line == "quit" {
                ctx.request_stop();
                return;
            }
            println!("echo: {line}");
            ctx.set(echoed, line).unwrap();
        }),
    }).expect("unique writer per port");

    let config = Config {
        keep_alive: true,
        ..Config::default()
    };
    let mut scheduler = Scheduler::with_config(env, config).expect("acyclic graph builds");
    let injector = scheduler.physical_injector();

    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if !injector.schedule(line_in, TimeValue::ZERO, line.clone()) {
                break;
            }
            if line == "quit" {
                break;
            }
        }
    });

    scheduler.run().unwrap();
}

//! Startup and shutdown reactions on a single reactor, no ports involved.

use reactor_rt::{run_to_completion, Env};

struct HelloState {
    success: bool,
}

fn main() {
    tracing_subscriber::fmt::init();

    let mut env = Env::new();
    let greeter = env.new_reactor("greeter", None, Box::new(HelloState { success: false }));

    env.add_reaction(reactor_rt::ReactionSpec {
        name: "say_hello".to_string(),
        reactor_key: greeter,
        trigger_ports: Vec::new(),
        trigger_actions: Vec::new(),
        triggers_startup: true,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(|ctx| {
            println!("Hello World.");
            ctx.state_mut::<HelloState>().unwrap().success = true;
            ctx.request_stop();
        }),
    }).expect("unique writer per port");

    env.add_reaction(reactor_rt::ReactionSpec {
        name: "say_goodbye".to_string(),
        reactor_key: greeter,
        trigger_ports: Vec::new(),
        trigger_actions: Vec::new(),
        triggers_startup: false,
        triggers_shutdown: true,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(|ctx| {
            println!("Shutdown invoked.");
            assert!(
                ctx.state::<HelloState>().unwrap().success,
                "startup reaction never ran"
            );
        }),
    }).expect("unique writer per port");

    run_to_completion(env).unwrap();
}

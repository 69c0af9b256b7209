//! Two timers with the same offset and period both trigger one reaction;
//! it observes both actions present at the shared tag and runs exactly once,
//! not once per timer.

use reactor_rt::{run_to_completion, EmptyState, Env, ReactionSpec, TimeValue};

fn main() {
    tracing_subscriber::fmt::init();

    let mut env = Env::new();
    let clock = env.new_reactor("cuckoo", None, Box::new(EmptyState));

    let hour = env.new_timer(clock, "hour", TimeValue::ZERO, TimeValue::from_seconds(1));
    let half = env.new_timer(clock, "half", TimeValue::ZERO, TimeValue::from_seconds(1));

    env.add_reaction(ReactionSpec {
        name: "cuckoo".to_string(),
        reactor_key: clock,
        trigger_ports: Vec::new(),
        trigger_actions: vec![hour, half],
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: Vec::new(),
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            let hour_present = ctx.get_action::<()>(hour).unwrap().is_some();
            let half_present = ctx.get_action::<()>(half).unwrap().is_some();
            println!("cuckoo! (hour={hour_present} half={half_present})");
            ctx.request_stop();
        }),
    })
    .expect("unique writer per port");

    run_to_completion(env).unwrap();
}

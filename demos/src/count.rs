//! A periodic timer driving a counter that reports its value on an output
//! port, stopping itself after a fixed number of ticks.

use reactor_rt::{run_to_completion, Direction, Env, ReactionSpec, TimeValue};

struct Count(u32);

fn main() {
    tracing_subscriber::fmt::init();

    let mut env = Env::new();
    let counter = env.new_reactor("counter", None, Box::new(Count(0)));

    let timer = env.new_timer(counter, "t", TimeValue::ZERO, TimeValue::from_seconds(1));
    let c = env.new_port::<u32>(counter, "c", Direction::Output);

    env.add_reaction(ReactionSpec {
        name: "reaction_t".to_string(),
        reactor_key: counter,
        trigger_ports: Vec::new(),
        trigger_actions: vec![timer],
        triggers_startup: false,
        triggers_shutdown: false,
        source_ports: Vec::new(),
        effect_ports: vec![c],
        effect_actions: Vec::new(),
        deadline: None,
        is_mutation: false,
        body: Box::new(move |ctx| {
            let count = &mut ctx.state_mut::<Count>().unwrap().0;
            *count += 1;
            let count = *count;
            ctx.set(c, count).unwrap();
            println!("{count}");
            if count >= 5 {
                ctx.request_stop();
            }
        }),
    }).expect("unique writer per port");

    run_to_completion(env).unwrap();
}

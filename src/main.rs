use clap::Parser;
use gridworld_dp::config::SolverConfig;
use gridworld_dp::envs::world_map::{load_world_map, DEFAULT_WORLD_MAP};
use gridworld_dp::mdps::mdp_simulator::mean_rollout_cost;
use gridworld_dp::mdps::mdp_solver_policy::MdpSolverPolicy;
use gridworld_dp::report::{render_policy, render_values, SolverReport};
use gridworld_dp::*;
use std::path::PathBuf;
use std::rc::Rc;
use tracing::info;

#[derive(Debug, Parser)]
#[command(version, about = "Solve a grid world with value iteration and policy iteration")]
struct Args {
    /// World map definition. A built-in maze is used when omitted.
    #[arg(short, long)]
    world: Option<PathBuf>,

    /// JSON solver configuration. Flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    gamma: Option<f64>,

    #[arg(long)]
    eps: Option<f64>,

    #[arg(long)]
    stochasticity: Option<f64>,

    #[arg(long, value_enum)]
    cost: Option<CostModel>,

    #[arg(long)]
    max_iterations: Option<usize>,

    /// Sampled rollouts from the start cell per policy.
    #[arg(long, default_value_t = 0)]
    episodes: usize,

    #[arg(long, default_value_t = 2718)]
    seed: u64,

    #[arg(long, default_value_t = 1000)]
    max_steps: usize,

    /// Print JSON reports instead of tables.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn solver_config(&self) -> Result<SolverConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("Loading configuration from {:?}", path);
                SolverConfig::load(path)?
            }
            None => SolverConfig::default(),
        };

        if let Some(gamma) = self.gamma {
            config.gamma = gamma;
        }
        if let Some(eps) = self.eps {
            config.eps = eps;
        }
        if let Some(p) = self.stochasticity {
            config.action_stochasticity = p;
        }
        if let Some(cost) = self.cost {
            config.cost = cost;
        }
        if let Some(n) = self.max_iterations {
            config.max_iterations = n;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gridworld_dp=info")),
        )
        .init();

    let args = Args::parse();
    let config = args.solver_config()?;

    let grid = match &args.world {
        Some(path) => {
            info!("Reading world from {:?}", path);
            load_world_map(path)?
        }
        None => DEFAULT_WORLD_MAP.parse()?,
    };
    let world = Rc::new(GridWorld::with_stochasticity(
        grid,
        config.action_stochasticity,
    )?);

    let mut vi = ValueIteration::new(Rc::clone(&world), config.cost.cost_fn(), config.gamma)?
        .with_eps(config.eps);
    let vi_ret = vi.execute(config.max_iterations)?;
    let vi_policy = vi.extract_policy()?;

    let mut pi = PolicyIteration::new(Rc::clone(&world), config.cost.cost_fn(), config.gamma)?;
    let pi_ret = pi.execute(config.max_iterations)?;

    let reports = [
        SolverReport::new(
            "value_iteration",
            vi_ret,
            config.gamma,
            &world,
            vi.value_fn(),
            &vi_policy,
        ),
        SolverReport::new(
            "policy_iteration",
            pi_ret,
            config.gamma,
            &world,
            pi.value_fn(),
            pi.policy(),
        ),
    ];

    if args.json {
        for r in &reports {
            println!("{}", r.to_json()?);
        }
    } else {
        println!(
            "Value Iteration (gamma = {:.2}), converged: {}, iterations: {}",
            config.gamma, vi_ret.0, vi_ret.1
        );
        println!("{}\n", render_values(&world, vi.value_fn()));
        println!("{}\n", render_policy(&world, &vi_policy));
        println!(
            "Policy Iteration (gamma = {:.2}), converged: {}, iterations: {}",
            config.gamma, pi_ret.0, pi_ret.1
        );
        println!("{}\n", render_values(&world, pi.value_fn()));
        println!("{}\n", render_policy(&world, pi.policy()));

        let disagreements = vi_policy
            .iter()
            .zip(pi.policy().iter())
            .filter(|(a, b)| a != b)
            .count();
        println!("Cells where the policies differ: {disagreements}");
    }

    if args.episodes > 0 {
        if let Some(start) = world.start_pos() {
            let vi_mdp = vi.mdp().clone();
            let pi_mdp = pi.mdp().clone();
            let solvers: [(&str, _, Rc<dyn MdpSolver>); 2] = [
                ("value_iteration", vi_mdp, Rc::new(vi)),
                ("policy_iteration", pi_mdp, Rc::new(pi)),
            ];
            for (name, mdp, solver) in solvers {
                let policy = MdpSolverPolicy { mdp_solver: solver };
                let cost = mean_rollout_cost(
                    &mdp,
                    &policy,
                    start,
                    args.episodes,
                    args.max_steps,
                    args.seed,
                )?;
                println!(
                    "{name}: mean discounted cost over {} episodes: {cost:.3}",
                    args.episodes
                );
            }
        }
    }

    Ok(())
}

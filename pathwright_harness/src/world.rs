// Point-body world the harness drives navigators in.
//
// Every agent is a point on the mesh floor. A `MoveCommand` is integrated
// along the agent's yaw (forward along the facing, positive side to the
// right) in movement units per second, and the result is accepted only when
// an area lies under the new XY and its floor is within a walkable step (or
// a jump, while airborne). Otherwise the agent stays put, which is how mesh
// boundaries act as walls. Z always snaps to the sampled floor.
//
// Agents alternate between two teams so the positional producer has
// opponents to orbit.

use pathwright_sim::command::{Buttons, MoveCommand};
use pathwright_sim::config::MeshParams;
use pathwright_sim::nav::NavMesh;
use pathwright_sim::types::{ActorId, Team};
use pathwright_sim::world::{ActorState, ControlPoint, FlagState};
use pathwright_sim::{AgentState, Vec3, WorldView};

/// Seconds an agent stays airborne after pressing jump.
const JUMP_AIR_TIME: f32 = 0.4;

pub struct HarnessWorld {
    pub time: f64,
    pub level_name: String,
    pub agents: Vec<AgentState>,
    /// Mirror of `agents` as seen by other agents; see `refresh_actors`.
    actors: Vec<ActorState>,
    air_time: Vec<f32>,
}

impl HarnessWorld {
    /// One agent per start position, on alternating teams.
    pub fn new(level_name: impl Into<String>, starts: &[Vec3]) -> Self {
        let agents: Vec<AgentState> = starts
            .iter()
            .enumerate()
            .map(|(i, &position)| AgentState {
                id: ActorId(i as u32 + 1),
                position,
                yaw: 0.0,
                team: Team(2 + (i % 2) as u8),
                alive: true,
                life_epoch: 0,
                on_ground: true,
                can_jump: true,
                attacking: false,
            })
            .collect();
        let mut world = Self {
            time: 0.0,
            level_name: level_name.into(),
            air_time: vec![0.0; agents.len()],
            agents,
            actors: Vec::new(),
        };
        world.refresh_actors();
        world
    }

    pub fn refresh_actors(&mut self) {
        self.actors = self
            .agents
            .iter()
            .map(|a| ActorState {
                id: a.id,
                team: a.team,
                position: a.position,
                alive: a.alive,
            })
            .collect();
    }

    /// The world as agent `index` sees it.
    pub fn view(&self, index: usize) -> AgentView<'_> {
        AgentView { world: self, index }
    }

    /// Apply one tick of `command` to agent `index`. Returns the planar
    /// distance actually moved.
    pub fn apply(
        &mut self,
        index: usize,
        command: &MoveCommand,
        mesh: &NavMesh,
        params: &MeshParams,
        dt: f32,
    ) -> f32 {
        let (Some(agent), Some(air)) = (self.agents.get_mut(index), self.air_time.get_mut(index))
        else {
            return 0.0;
        };

        if command.buttons.contains(Buttons::JUMP) && agent.on_ground {
            *air = JUMP_AIR_TIME;
        }

        let (sin, cos) = agent.yaw.to_radians().sin_cos();
        let dx = (cos * command.forward + sin * command.side) * dt;
        let dy = (sin * command.forward - cos * command.side) * dt;
        let from = agent.position;
        let candidate = Vec3::new(from.x + dx, from.y + dy, from.z);

        if let Some(area) = mesh.best_area_from_xyz(candidate, params) {
            let floor = area.sample_z_at_xy(candidate.x, candidate.y);
            let climb = floor - from.z;
            let reach = if *air > 0.0 {
                params.jump_height + params.step_height
            } else {
                params.step_height
            };
            if climb <= reach {
                agent.position = Vec3::new(candidate.x, candidate.y, floor);
            }
        }

        *air = (*air - dt).max(0.0);
        agent.on_ground = *air <= 0.0;
        if let Some(view) = command.view {
            agent.yaw = view.yaw;
        }
        from.distance_2d(agent.position)
    }
}

pub struct AgentView<'a> {
    world: &'a HarnessWorld,
    index: usize,
}

impl WorldView for AgentView<'_> {
    fn now(&self) -> f64 {
        self.world.time
    }

    fn level_name(&self) -> &str {
        &self.world.level_name
    }

    fn agent(&self) -> Option<&AgentState> {
        self.world.agents.get(self.index)
    }

    fn actors(&self) -> &[ActorState] {
        &self.world.actors
    }

    fn flags(&self) -> &[FlagState] {
        &[]
    }

    fn control_points(&self) -> &[ControlPoint] {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pathwright_sim::command::ViewAngles;
    use pathwright_sim::nav::{Area, Direction};
    use pathwright_sim::types::AreaId;

    fn forward(speed: f32) -> MoveCommand {
        MoveCommand {
            forward: speed,
            ..MoveCommand::idle()
        }
    }

    #[test]
    fn moves_along_yaw_and_turns_with_view() {
        let mesh = NavMesh::grid("grid", 4, 4, 100.0).unwrap();
        let params = MeshParams::default();
        let mut world = HarnessWorld::new("test", &[Vec3::new(50.0, 50.0, 0.0)]);

        let moved = world.apply(0, &forward(100.0), &mesh, &params, 0.5);
        assert!((moved - 50.0).abs() < 1e-3);
        assert!((world.agents[0].position.x - 100.0).abs() < 1e-3);

        let turn = MoveCommand {
            side: 100.0,
            view: Some(ViewAngles {
                pitch: 0.0,
                yaw: 90.0,
            }),
            ..MoveCommand::idle()
        };
        // Side is to the right of the current facing (+X): toward -Y.
        world.apply(0, &turn, &mesh, &params, 0.25);
        assert!((world.agents[0].position.y - 25.0).abs() < 1e-3);
        assert_eq!(world.agents[0].yaw, 90.0);
    }

    #[test]
    fn mesh_edges_and_tall_steps_block() {
        let mut low = Area::flat(AreaId(1), 0.0, 0.0, 100.0, 100.0, 0.0);
        let high = Area::flat(AreaId(2), 100.0, 0.0, 200.0, 100.0, 50.0);
        low.connect(Direction::East, AreaId(2));
        let mesh = NavMesh::new("step", vec![low, high], Vec::new()).unwrap();
        let params = MeshParams::default();
        let mut world = HarnessWorld::new("test", &[Vec3::new(90.0, 50.0, 0.0)]);

        // Walking into the 50-unit step goes nowhere.
        assert_eq!(world.apply(0, &forward(100.0), &mesh, &params, 0.2), 0.0);
        // Walking off the south edge of the mesh goes nowhere either.
        world.agents[0].yaw = -90.0;
        world.agents[0].position = Vec3::new(50.0, 5.0, 0.0);
        assert_eq!(world.apply(0, &forward(100.0), &mesh, &params, 0.2), 0.0);

        // A jump clears the step.
        world.agents[0].yaw = 0.0;
        world.agents[0].position = Vec3::new(90.0, 50.0, 0.0);
        let jump = MoveCommand {
            forward: 100.0,
            buttons: Buttons::JUMP | Buttons::DUCK,
            ..MoveCommand::idle()
        };
        world.apply(0, &jump, &mesh, &params, 0.2);
        assert_eq!(world.agents[0].position.z, 50.0);
        assert!(!world.agents[0].on_ground);
    }

    #[test]
    fn views_are_per_agent_and_share_actors() {
        let world = HarnessWorld::new(
            "test",
            &[Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)],
        );
        let second = world.view(1);
        assert_eq!(second.agent().map(|a| a.id), Some(ActorId(2)));
        assert_eq!(second.agent().map(|a| a.team), Some(Team(3)));
        assert_eq!(second.actors().len(), 2);
        assert!(world.view(2).agent().is_none());
    }
}
